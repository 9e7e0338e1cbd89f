//! OpenAPI document for the `/api/v1` surface, served as JSON at
//! `/api-docs/openapi.json` and rendered at `/docs`.

use utoipa::OpenApi;

use crate::api;
use crate::db::models::beds::BedState;
use crate::errors::{ErrorBody, ErrorKind};
use crate::types::{BedKey, PatientDoc};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "wardctl",
        description = "Hospital admissions, bed occupancy and physician vacation scheduling"
    ),
    paths(
        api::handlers::admissions::create_admission,
        api::handlers::admissions::list_admissions,
        api::handlers::admissions::get_admission,
        api::handlers::admissions::list_assignments,
        api::handlers::admissions::transfer_admission,
        api::handlers::admissions::close_admission,
        api::handlers::beds::list_beds,
        api::handlers::beds::create_bed,
        api::handlers::beds::get_bed,
        api::handlers::beds::delete_bed,
        api::handlers::beds::set_maintenance,
        api::handlers::beds::set_available,
        api::handlers::vacations::list_vacations,
        api::handlers::vacations::request_vacation,
        api::handlers::vacations::update_vacation,
        api::handlers::vacations::cancel_vacation,
        api::handlers::vacations::list_shifts,
    ),
    components(
        schemas(
            ErrorBody,
            ErrorKind,
            BedKey,
            BedState,
            PatientDoc,
            api::models::admissions::AdmissionCreate,
            api::models::admissions::AdmissionResponse,
            api::models::admissions::AssignmentResponse,
            api::models::admissions::TransferRequest,
            api::models::beds::BedCreate,
            api::models::beds::BedResponse,
            api::models::vacations::VacationDates,
            api::models::vacations::VacationResponse,
            api::models::vacations::ShiftResponse,
        )
    ),
    tags(
        (name = "admissions", description = "Patient admissions, transfers and discharges"),
        (name = "beds", description = "Bed registry administration"),
        (name = "physicians", description = "Physician vacations and duty shifts"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/admissions",
            "/api/v1/admissions/{id}",
            "/api/v1/admissions/{id}/assignments",
            "/api/v1/admissions/{id}/transfer",
            "/api/v1/admissions/{id}/close",
            "/api/v1/beds",
            "/api/v1/rooms/{room}/beds/{bed}",
            "/api/v1/rooms/{room}/beds/{bed}/maintenance",
            "/api/v1/rooms/{room}/beds/{bed}/available",
            "/api/v1/physicians/{license}/vacations",
            "/api/v1/physicians/{license}/vacations/{start_date}",
            "/api/v1/physicians/{license}/shifts",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
