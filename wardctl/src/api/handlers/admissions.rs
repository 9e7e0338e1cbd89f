use crate::api::models::admissions::{
    AdmissionCreate, AdmissionResponse, AssignmentResponse, ListAdmissionsQuery, TransferRequest,
};
use crate::errors::{ErrorBody, Result};
use crate::types::{AdmissionId, BedKey};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/api/v1/admissions",
    tag = "admissions",
    summary = "Admit a patient",
    request_body = AdmissionCreate,
    responses(
        (status = 201, description = "Admission created and bed occupied", body = AdmissionResponse),
        (status = 400, description = "Invalid dates or partial bed selection", body = ErrorBody),
        (status = 404, description = "Unknown patient, physician, room or bed", body = ErrorBody),
        (status = 409, description = "Patient already admitted or bed unavailable", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_admission(
    State(state): State<AppState>,
    Json(body): Json<AdmissionCreate>,
) -> Result<(StatusCode, Json<AdmissionResponse>)> {
    let id = state.admissions.create_admission(&body.into()).await?;
    let details = state.admissions.get_admission(id).await?;

    Ok((StatusCode::CREATED, Json(details.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/admissions",
    tag = "admissions",
    summary = "List admissions",
    params(ListAdmissionsQuery),
    responses(
        (status = 200, description = "Admissions, newest first", body = Vec<AdmissionResponse>),
        (status = 400, description = "Incomplete patient filter", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_admissions(
    State(state): State<AppState>,
    Query(query): Query<ListAdmissionsQuery>,
) -> Result<Json<Vec<AdmissionResponse>>> {
    let admissions = state.admissions.list_admissions(&query.to_filter()?).await?;

    Ok(Json(admissions.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/admissions/{id}",
    tag = "admissions",
    summary = "Get an admission",
    params(("id" = i64, Path, description = "Admission ID")),
    responses(
        (status = 200, description = "Admission with its current bed", body = AdmissionResponse),
        (status = 404, description = "Admission not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(admission_id = %id))]
pub async fn get_admission(State(state): State<AppState>, Path(id): Path<AdmissionId>) -> Result<Json<AdmissionResponse>> {
    Ok(Json(state.admissions.get_admission(id).await?.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/admissions/{id}/assignments",
    tag = "admissions",
    summary = "Bed history of an admission",
    params(("id" = i64, Path, description = "Admission ID")),
    responses(
        (status = 200, description = "Assignments, oldest first", body = Vec<AssignmentResponse>),
        (status = 404, description = "Admission not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(admission_id = %id))]
pub async fn list_assignments(
    State(state): State<AppState>,
    Path(id): Path<AdmissionId>,
) -> Result<Json<Vec<AssignmentResponse>>> {
    let history = state.admissions.assignment_history(id).await?;

    Ok(Json(history.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/admissions/{id}/transfer",
    tag = "admissions",
    summary = "Transfer a patient to another bed",
    params(("id" = i64, Path, description = "Admission ID")),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "New assignment", body = AssignmentResponse),
        (status = 404, description = "Admission not ongoing or bed not found", body = ErrorBody),
        (status = 409, description = "Destination bed is not available", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(admission_id = %id))]
pub async fn transfer_admission(
    State(state): State<AppState>,
    Path(id): Path<AdmissionId>,
    Json(body): Json<TransferRequest>,
) -> Result<Json<AssignmentResponse>> {
    let destination = BedKey::new(body.room_number, body.bed_number);
    let assignment = state.admissions.transfer_bed(id, destination).await?;

    Ok(Json(assignment.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/admissions/{id}/close",
    tag = "admissions",
    summary = "Discharge a patient",
    params(("id" = i64, Path, description = "Admission ID")),
    responses(
        (status = 200, description = "Closed admission, end date set to today", body = AdmissionResponse),
        (status = 404, description = "Admission not found", body = ErrorBody),
        (status = 409, description = "Already closed or starts in the future", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(admission_id = %id))]
pub async fn close_admission(State(state): State<AppState>, Path(id): Path<AdmissionId>) -> Result<Json<AdmissionResponse>> {
    state.admissions.close_admission(id).await?;

    Ok(Json(state.admissions.get_admission(id).await?.into()))
}

#[cfg(test)]
mod tests {
    use crate::api::models::admissions::{AdmissionResponse, AssignmentResponse};
    use crate::db::models::beds::BedState;
    use crate::errors::{ErrorBody, ErrorKind};
    use crate::test_utils::{create_test_app, seed_bed, seed_patient, seed_physician, seed_room};
    use crate::types::BedKey;
    use serde_json::json;
    use sqlx::PgPool;

    async fn seed_ward(pool: &PgPool) {
        seed_physician(pool, 42).await;
        seed_patient(pool, "DNI", "30111222").await;
        seed_room(pool, 101).await;
        seed_bed(pool, BedKey::new(101, 1), BedState::Available).await;
        seed_bed(pool, BedKey::new(101, 2), BedState::Available).await;
    }

    fn admission_body() -> serde_json::Value {
        json!({
            "patient_doc_type": "DNI",
            "patient_doc_number": "30111222",
            "physician_license": 42,
            "start_date": "2024-03-01",
            "end_date": "2024-03-10"
        })
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_admission_lifecycle_over_http(pool: PgPool) {
        seed_ward(&pool).await;
        let server = create_test_app(pool.clone()).await;

        let response = server.post("/api/v1/admissions").json(&admission_body()).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let admission: AdmissionResponse = response.json();
        assert_eq!(admission.current_bed, Some(BedKey::new(101, 1)));
        assert_eq!(admission.expected_end_date.map(|d| d.to_string()), Some("2024-03-10".to_string()));

        let response = server
            .post(&format!("/api/v1/admissions/{}/transfer", admission.id))
            .json(&json!({ "room_number": 101, "bed_number": 2 }))
            .await;
        response.assert_status_ok();
        let assignment: AssignmentResponse = response.json();
        assert_eq!(assignment.bed_number, 2);

        let history: Vec<AssignmentResponse> = server
            .get(&format!("/api/v1/admissions/{}/assignments", admission.id))
            .await
            .json();
        assert_eq!(history.len(), 2);

        let response = server.post(&format!("/api/v1/admissions/{}/close", admission.id)).await;
        response.assert_status_ok();
        let closed: AdmissionResponse = response.json();
        assert!(closed.end_date.is_some());
        assert_eq!(closed.current_bed, None);

        let listed: Vec<AdmissionResponse> = server.get("/api/v1/admissions").add_query_param("ongoing", true).await.json();
        assert!(listed.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_error_bodies(pool: PgPool) {
        seed_ward(&pool).await;
        let server = create_test_app(pool.clone()).await;

        let mut body = admission_body();
        body["room_number"] = json!(101);
        let response = server.post("/api/v1/admissions").json(&body).await;
        response.assert_status_bad_request();
        let error: ErrorBody = response.json();
        assert_eq!(error.kind, ErrorKind::InvalidArgument);
        assert!(!error.retryable);

        let response = server.get("/api/v1/admissions/404").await;
        response.assert_status_not_found();
        assert_eq!(response.json::<ErrorBody>().kind, ErrorKind::NotFound);

        server.post("/api/v1/admissions").json(&admission_body()).await.assert_status(axum::http::StatusCode::CREATED);
        let response = server.post("/api/v1/admissions").json(&admission_body()).await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
        assert_eq!(response.json::<ErrorBody>().kind, ErrorKind::Conflict);

        let response = server
            .get("/api/v1/admissions")
            .add_query_param("patient_doc_type", "DNI")
            .await;
        response.assert_status_bad_request();
    }
}
