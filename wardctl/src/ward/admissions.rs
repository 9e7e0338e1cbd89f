//! Admission lifecycle: admit, transfer, discharge.
//!
//! Every mutating operation runs in one READ COMMITTED transaction and takes
//! row locks before it reads anything it will decide on:
//!
//! - the admission row (`FOR UPDATE`) for transfers and closures, so two
//!   concurrent operations on one admission serialize
//! - every bed it touches, in (room, bed) order, so overlapping transfers
//!   cannot deadlock each other
//!
//! Bed state and assignment history are always written in the same transaction.
//! A bed is `occupied` exactly when one open assignment references it.

use crate::db::{
    handlers::{Admissions, Assignments, Beds, Patients, Physicians, Rooms},
    models::{
        admissions::{AdmissionCreateDBRequest, AdmissionDBResponse, AdmissionFilter},
        assignments::AssignmentDBResponse,
        beds::BedState,
        directory::{PatientDBResponse, PhysicianDBResponse},
    },
};
use crate::errors::{Error, Result};
use crate::types::{AdmissionId, BedKey, BedNumber, License, PatientDoc, RoomNumber};
use crate::ward::{finish, validation};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

/// Input for [`AdmissionOrchestrator::create_admission`].
#[derive(Debug, Clone)]
pub struct CreateAdmission {
    pub patient: PatientDoc,
    pub physician_license: License,
    pub start_date: NaiveDate,
    /// Planned discharge date, if known
    pub end_date: Option<NaiveDate>,
    pub room_number: Option<RoomNumber>,
    pub bed_number: Option<BedNumber>,
}

/// An admission together with the bed it currently holds.
#[derive(Debug, Clone)]
pub struct AdmissionDetails {
    pub admission: AdmissionDBResponse,
    /// `None` once the admission is closed
    pub current_bed: Option<BedKey>,
    /// Resolved on single-admission reads only
    pub patient: Option<PatientDBResponse>,
    pub physician: Option<PhysicianDBResponse>,
}

#[derive(Clone)]
pub struct AdmissionOrchestrator {
    pool: PgPool,
}

impl AdmissionOrchestrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Admit a patient and occupy a bed.
    ///
    /// With an explicit room and bed, that bed must exist and be available.
    /// Without one, the lowest available bed (by bed number, then room) is taken.
    #[instrument(skip(self, request), fields(patient = %request.patient, physician = request.physician_license), err)]
    pub async fn create_admission(&self, request: &CreateAdmission) -> Result<AdmissionId> {
        let requested_bed = validation::bed_pair(request.room_number, request.bed_number)?;
        validation::end_not_before_start(request.start_date, request.end_date)?;

        let mut tx = self.pool.begin().await?;
        let outcome = Self::admit(&mut tx, request, requested_bed).await;
        let (admission, bed) = finish(tx, outcome).await?;

        info!("Admitted patient {} as admission {} into {}", request.patient, admission.id, bed);
        Ok(admission.id)
    }

    async fn admit(
        conn: &mut PgConnection,
        request: &CreateAdmission,
        requested_bed: Option<BedKey>,
    ) -> Result<(AdmissionDBResponse, BedKey)> {
        if !Patients::new(&mut *conn).exists(&request.patient).await? {
            return Err(Error::not_found("Patient", &request.patient));
        }
        if !Physicians::new(&mut *conn).exists(request.physician_license).await? {
            return Err(Error::not_found("Physician", request.physician_license));
        }
        if let Some(existing) = Admissions::new(&mut *conn).ongoing_for_patient(&request.patient).await? {
            return Err(Error::conflict(format!(
                "Patient {} already has ongoing admission {}",
                request.patient, existing.id
            )));
        }

        let bed = match requested_bed {
            Some(key) => {
                if !Rooms::new(&mut *conn).exists(key.room_number).await? {
                    return Err(Error::not_found("Room", key.room_number));
                }
                let bed = Beds::new(&mut *conn)
                    .lock(key)
                    .await?
                    .ok_or_else(|| Error::not_found("Bed", key))?;
                if bed.state != BedState::Available {
                    return Err(Error::conflict(format!("{} is {}", key, bed.state)));
                }
                key
            }
            None => Beds::new(&mut *conn)
                .lock_first_available()
                .await?
                .ok_or_else(|| Error::conflict("No available bed"))?
                .key(),
        };

        let admission = Admissions::new(&mut *conn)
            .create(&AdmissionCreateDBRequest {
                patient: request.patient.clone(),
                physician_license: request.physician_license,
                start_date: request.start_date,
                expected_end_date: request.end_date,
            })
            .await?;
        Assignments::new(&mut *conn).append(admission.id, bed).await?;
        Beds::new(&mut *conn).occupy(bed).await?;

        Ok((admission, bed))
    }

    /// Move an ongoing admission to another available bed.
    /// The previous bed is released and a new assignment row is appended.
    #[instrument(skip(self), fields(destination = %destination), err)]
    pub async fn transfer_bed(&self, admission_id: AdmissionId, destination: BedKey) -> Result<AssignmentDBResponse> {
        let mut tx = self.pool.begin().await?;
        let outcome = Self::transfer(&mut tx, admission_id, destination).await;
        let (assignment, previous) = finish(tx, outcome).await?;

        match previous {
            Some(from) => info!("Transferred admission {} from {} to {}", admission_id, from, destination),
            None => info!("Assigned admission {} to {}", admission_id, destination),
        }
        Ok(assignment)
    }

    async fn transfer(
        conn: &mut PgConnection,
        admission_id: AdmissionId,
        destination: BedKey,
    ) -> Result<(AssignmentDBResponse, Option<BedKey>)> {
        Admissions::new(&mut *conn)
            .lock(admission_id)
            .await?
            .filter(|admission| admission.is_ongoing())
            .ok_or_else(|| Error::not_found("Ongoing admission", admission_id))?;

        let current = Assignments::new(&mut *conn)
            .latest(admission_id)
            .await?
            .map(|assignment| assignment.bed());

        let mut keys = vec![destination];
        keys.extend(current.filter(|bed| *bed != destination));
        let locked = Beds::new(&mut *conn).lock_many(&keys).await?;

        let target = locked
            .iter()
            .find(|bed| bed.key() == destination)
            .ok_or_else(|| Error::not_found("Bed", destination))?;
        if target.state != BedState::Available {
            return Err(Error::conflict(format!("{} is {}", destination, target.state)));
        }

        if let Some(from) = current {
            Beds::new(&mut *conn).release(from).await?;
        }
        Beds::new(&mut *conn).occupy(destination).await?;
        let assignment = Assignments::new(&mut *conn).append(admission_id, destination).await?;

        Ok((assignment, current))
    }

    /// Discharge a patient today, releasing every bed the admission holds.
    #[instrument(skip(self), err)]
    pub async fn close_admission(&self, admission_id: AdmissionId) -> Result<AdmissionDBResponse> {
        let mut tx = self.pool.begin().await?;
        let outcome = Self::close(&mut tx, admission_id).await;
        let (admission, released) = finish(tx, outcome).await?;

        info!(
            "Closed admission {} on {:?}, released {} bed(s)",
            admission_id,
            admission.end_date,
            released.len()
        );
        Ok(admission)
    }

    async fn close(conn: &mut PgConnection, admission_id: AdmissionId) -> Result<(AdmissionDBResponse, Vec<BedKey>)> {
        let admission = Admissions::new(&mut *conn)
            .lock(admission_id)
            .await?
            .ok_or_else(|| Error::not_found("Admission", admission_id))?;
        if !admission.is_ongoing() {
            return Err(Error::conflict(format!("Admission {admission_id} is already closed")));
        }

        let today = Admissions::new(&mut *conn).current_date().await?;
        if admission.start_date > today {
            return Err(Error::conflict(format!(
                "Admission {} starts on {}, it cannot be closed before then",
                admission_id, admission.start_date
            )));
        }

        let mut open = Assignments::new(&mut *conn).open_beds(admission_id).await?;
        open.sort();
        Beds::new(&mut *conn).lock_many(&open).await?;
        for bed in &open {
            Beds::new(&mut *conn).release(*bed).await?;
        }

        let closed = Admissions::new(&mut *conn).close(admission_id).await?;
        Ok((closed, open))
    }

    #[instrument(skip(self), err)]
    pub async fn get_admission(&self, admission_id: AdmissionId) -> Result<AdmissionDetails> {
        let mut conn = self.pool.acquire().await?;
        let admission = Admissions::new(&mut conn)
            .get(admission_id)
            .await?
            .ok_or_else(|| Error::not_found("Admission", admission_id))?;

        let current_bed = if admission.is_ongoing() {
            Assignments::new(&mut conn)
                .latest(admission_id)
                .await?
                .map(|assignment| assignment.bed())
        } else {
            None
        };
        let patient = Patients::new(&mut conn).get(&admission.patient()).await?;
        let physician = Physicians::new(&mut conn).get(admission.physician_license).await?;

        Ok(AdmissionDetails {
            admission,
            current_bed,
            patient,
            physician,
        })
    }

    #[instrument(skip(self, filter), err)]
    pub async fn list_admissions(&self, filter: &AdmissionFilter) -> Result<Vec<AdmissionDetails>> {
        let mut conn = self.pool.acquire().await?;
        let admissions = Admissions::new(&mut conn).list(filter).await?;

        let ongoing: Vec<AdmissionId> = admissions.iter().filter(|a| a.is_ongoing()).map(|a| a.id).collect();
        let mut latest = Assignments::new(&mut conn).latest_bulk(&ongoing).await?;

        Ok(admissions
            .into_iter()
            .map(|admission| {
                let current_bed = latest.remove(&admission.id).map(|assignment| assignment.bed());
                AdmissionDetails {
                    admission,
                    current_bed,
                    patient: None,
                    physician: None,
                }
            })
            .collect())
    }

    /// Every bed the admission has held, oldest first
    #[instrument(skip(self), err)]
    pub async fn assignment_history(&self, admission_id: AdmissionId) -> Result<Vec<AssignmentDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        if Admissions::new(&mut conn).get(admission_id).await?.is_none() {
            return Err(Error::not_found("Admission", admission_id));
        }

        Ok(Assignments::new(&mut conn).history(admission_id).await?)
    }
}
