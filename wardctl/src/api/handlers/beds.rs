use crate::api::models::beds::{BedCreate, BedResponse, ListBedsQuery};
use crate::errors::{ErrorBody, Result};
use crate::types::{BedKey, BedNumber, RoomNumber};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/api/v1/beds",
    tag = "beds",
    summary = "List beds",
    params(ListBedsQuery),
    responses(
        (status = 200, description = "Beds ordered by room and bed number", body = Vec<BedResponse>),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_beds(State(state): State<AppState>, Query(query): Query<ListBedsQuery>) -> Result<Json<Vec<BedResponse>>> {
    let beds = state.beds.list_beds(&query.into()).await?;

    Ok(Json(beds.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/beds",
    tag = "beds",
    summary = "Register a bed",
    request_body = BedCreate,
    responses(
        (status = 201, description = "Bed created as available", body = BedResponse),
        (status = 404, description = "Room not found", body = ErrorBody),
        (status = 409, description = "Bed already exists", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_bed(State(state): State<AppState>, Json(body): Json<BedCreate>) -> Result<(StatusCode, Json<BedResponse>)> {
    let bed = state.beds.create_bed(BedKey::new(body.room_number, body.bed_number)).await?;

    Ok((StatusCode::CREATED, Json(bed.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room}/beds/{bed}",
    tag = "beds",
    summary = "Get a bed",
    params(
        ("room" = i32, Path, description = "Room number"),
        ("bed" = i32, Path, description = "Bed number"),
    ),
    responses(
        (status = 200, description = "Bed with its open assignment count", body = BedResponse),
        (status = 404, description = "Bed not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(room = room, bed = bed))]
pub async fn get_bed(State(state): State<AppState>, Path((room, bed)): Path<(RoomNumber, BedNumber)>) -> Result<Json<BedResponse>> {
    Ok(Json(state.beds.get_bed(BedKey::new(room, bed)).await?.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rooms/{room}/beds/{bed}",
    tag = "beds",
    summary = "Delete a bed",
    params(
        ("room" = i32, Path, description = "Room number"),
        ("bed" = i32, Path, description = "Bed number"),
    ),
    responses(
        (status = 204, description = "Bed deleted"),
        (status = 404, description = "Bed not found", body = ErrorBody),
        (status = 409, description = "Bed appears in assignment history", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(room = room, bed = bed))]
pub async fn delete_bed(State(state): State<AppState>, Path((room, bed)): Path<(RoomNumber, BedNumber)>) -> Result<StatusCode> {
    state.beds.delete_bed(BedKey::new(room, bed)).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room}/beds/{bed}/maintenance",
    tag = "beds",
    summary = "Take a bed out of service",
    params(
        ("room" = i32, Path, description = "Room number"),
        ("bed" = i32, Path, description = "Bed number"),
    ),
    responses(
        (status = 200, description = "Bed in maintenance", body = BedResponse),
        (status = 404, description = "Bed not found", body = ErrorBody),
        (status = 409, description = "Bed is occupied", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(room = room, bed = bed))]
pub async fn set_maintenance(
    State(state): State<AppState>,
    Path((room, bed)): Path<(RoomNumber, BedNumber)>,
) -> Result<Json<BedResponse>> {
    Ok(Json(state.beds.set_maintenance(BedKey::new(room, bed)).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room}/beds/{bed}/available",
    tag = "beds",
    summary = "Return a bed from maintenance",
    params(
        ("room" = i32, Path, description = "Room number"),
        ("bed" = i32, Path, description = "Bed number"),
    ),
    responses(
        (status = 200, description = "Bed available", body = BedResponse),
        (status = 404, description = "Bed not found", body = ErrorBody),
        (status = 409, description = "Bed is not in maintenance", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(room = room, bed = bed))]
pub async fn set_available(
    State(state): State<AppState>,
    Path((room, bed)): Path<(RoomNumber, BedNumber)>,
) -> Result<Json<BedResponse>> {
    Ok(Json(state.beds.set_available(BedKey::new(room, bed)).await?.into()))
}

#[cfg(test)]
mod tests {
    use crate::api::models::beds::BedResponse;
    use crate::db::models::beds::BedState;
    use crate::test_utils::{create_test_app, seed_room};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_bed_administration_over_http(pool: PgPool) {
        seed_room(&pool, 101).await;
        let server = create_test_app(pool.clone()).await;

        let response = server.post("/api/v1/beds").json(&json!({ "room_number": 101, "bed_number": 1 })).await;
        response.assert_status(StatusCode::CREATED);

        server
            .post("/api/v1/beds")
            .json(&json!({ "room_number": 101, "bed_number": 1 }))
            .await
            .assert_status(StatusCode::CONFLICT);
        server
            .post("/api/v1/beds")
            .json(&json!({ "room_number": 999, "bed_number": 1 }))
            .await
            .assert_status_not_found();

        let bed: BedResponse = server.post("/api/v1/rooms/101/beds/1/maintenance").await.json();
        assert_eq!(bed.state, BedState::Maintenance);

        let in_maintenance: Vec<BedResponse> = server.get("/api/v1/beds").add_query_param("state", "maintenance").await.json();
        assert_eq!(in_maintenance.len(), 1);

        let bed: BedResponse = server.post("/api/v1/rooms/101/beds/1/available").await.json();
        assert_eq!(bed.state, BedState::Available);

        let bed: BedResponse = server.get("/api/v1/rooms/101/beds/1").await.json();
        assert_eq!(bed.open_assignments, Some(0));

        server.delete("/api/v1/rooms/101/beds/1").await.assert_status(StatusCode::NO_CONTENT);
        server.get("/api/v1/rooms/101/beds/1").await.assert_status_not_found();
    }
}
