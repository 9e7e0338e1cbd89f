use crate::api::models::vacations::{ShiftResponse, VacationDates, VacationResponse};
use crate::db::models::vacations::VacationPeriod;
use crate::errors::{ErrorBody, Result};
use crate::types::License;
use crate::ward::retry_serializable;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;

#[utoipa::path(
    get,
    path = "/api/v1/physicians/{license}/vacations",
    tag = "physicians",
    summary = "List a physician's vacations",
    params(("license" = i32, Path, description = "Physician license number")),
    responses(
        (status = 200, description = "Vacations ordered by start date", body = Vec<VacationResponse>),
        (status = 404, description = "Physician not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(license = license))]
pub async fn list_vacations(State(state): State<AppState>, Path(license): Path<License>) -> Result<Json<Vec<VacationResponse>>> {
    let vacations = state.vacations.list_vacations(license).await?;

    Ok(Json(vacations.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/physicians/{license}/vacations",
    tag = "physicians",
    summary = "Request a vacation",
    description = "Runs under SERIALIZABLE isolation with the duty roster locked. \
                   Serialization failures are retried server-side up to `vacations.max_attempts` times; \
                   a 409 with `retryable: true` means every attempt lost the race.",
    params(("license" = i32, Path, description = "Physician license number")),
    request_body = VacationDates,
    responses(
        (status = 201, description = "Vacation booked", body = VacationResponse),
        (status = 400, description = "Start date after end date", body = ErrorBody),
        (status = 404, description = "Physician not found", body = ErrorBody),
        (status = 409, description = "Overlaps another vacation or a duty shift", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(license = license))]
pub async fn request_vacation(
    State(state): State<AppState>,
    Path(license): Path<License>,
    Json(body): Json<VacationDates>,
) -> Result<(StatusCode, Json<VacationResponse>)> {
    let period = VacationPeriod::new(license, body.start_date, body.end_date);
    let scheduler = &state.vacations;
    let retry = &state.config.vacations;

    let vacation = retry_serializable(retry.max_attempts, retry.retry_backoff, move || scheduler.request_vacation(period)).await?;

    Ok((StatusCode::CREATED, Json(vacation.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/physicians/{license}/vacations/{start_date}",
    tag = "physicians",
    summary = "Move a vacation to new dates",
    description = "Replaces the vacation starting on `start_date` atomically. If the new dates are rejected the old vacation is kept.",
    params(
        ("license" = i32, Path, description = "Physician license number"),
        ("start_date" = String, Path, description = "Start date of the existing vacation (YYYY-MM-DD)"),
    ),
    request_body = VacationDates,
    responses(
        (status = 200, description = "Vacation moved", body = VacationResponse),
        (status = 400, description = "Start date after end date", body = ErrorBody),
        (status = 404, description = "Vacation not found", body = ErrorBody),
        (status = 409, description = "New dates overlap another vacation or a duty shift", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(license = license, start_date = %start_date))]
pub async fn update_vacation(
    State(state): State<AppState>,
    Path((license, start_date)): Path<(License, NaiveDate)>,
    Json(body): Json<VacationDates>,
) -> Result<Json<VacationResponse>> {
    let old = state.vacations.get_vacation(license, start_date).await?.period();
    let new = VacationPeriod::new(license, body.start_date, body.end_date);
    let scheduler = &state.vacations;
    let retry = &state.config.vacations;

    let vacation = retry_serializable(retry.max_attempts, retry.retry_backoff, move || scheduler.update_vacation(old, new)).await?;

    Ok(Json(vacation.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/physicians/{license}/vacations/{start_date}",
    tag = "physicians",
    summary = "Cancel a vacation",
    params(
        ("license" = i32, Path, description = "Physician license number"),
        ("start_date" = String, Path, description = "Start date of the vacation (YYYY-MM-DD)"),
    ),
    responses(
        (status = 204, description = "Vacation cancelled"),
        (status = 404, description = "Vacation not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(license = license, start_date = %start_date))]
pub async fn cancel_vacation(
    State(state): State<AppState>,
    Path((license, start_date)): Path<(License, NaiveDate)>,
) -> Result<StatusCode> {
    let vacation = state.vacations.get_vacation(license, start_date).await?;
    state.vacations.cancel_vacation(vacation.period()).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/physicians/{license}/shifts",
    tag = "physicians",
    summary = "List a physician's duty shifts",
    params(("license" = i32, Path, description = "Physician license number")),
    responses(
        (status = 200, description = "Shifts ordered by time", body = Vec<ShiftResponse>),
        (status = 404, description = "Physician not found", body = ErrorBody),
    )
)]
#[tracing::instrument(skip_all, fields(license = license))]
pub async fn list_shifts(State(state): State<AppState>, Path(license): Path<License>) -> Result<Json<Vec<ShiftResponse>>> {
    let shifts = state.vacations.list_shifts(license).await?;

    Ok(Json(shifts.into_iter().map(Into::into).collect()))
}
