// lib/src/appointments.rs

use models::{Appointment, AppointmentStatus, ClinicResult, RecordId, RecordPatch};
use security::Caller;

use crate::service::ResourceService;

impl ResourceService {
    /// Owners cancel rather than delete; the appointment stays on record.
    pub async fn cancel_appointment(&self, caller: &Caller, appointment_id: RecordId) -> ClinicResult<Appointment> {
        self.set_appointment_status(caller, appointment_id, AppointmentStatus::Cancelled).await
    }

    pub async fn complete_appointment(&self, caller: &Caller, appointment_id: RecordId) -> ClinicResult<Appointment> {
        self.set_appointment_status(caller, appointment_id, AppointmentStatus::Completed).await
    }

    async fn set_appointment_status(
        &self,
        caller: &Caller,
        appointment_id: RecordId,
        status: AppointmentStatus,
    ) -> ClinicResult<Appointment> {
        let patch = RecordPatch::new().set("status", status.to_string());
        self.update(caller, appointment_id, &patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::service::tests::{account, day};
    use models::{ErrorKind, Role};
    use security::PolicyTable;

    #[tokio::test]
    async fn cancelled_appointments_stay_cancelled() {
        let service = ResourceService::new(Database::in_memory(), PolicyTable::default());
        let db = service.database();
        let doctor = account(db, "doc", Role::Doctor).await;
        let patient = service.caller_for(account(db, "pat", Role::Patient).await.id).await.unwrap();
        let booked = service
            .create(&patient, Appointment::new(patient.id, doctor.id, day(12), "16:45"))
            .await
            .unwrap();

        let cancelled = service.cancel_appointment(&patient, booked.id).await.unwrap();
        assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
        // cancelling twice is harmless
        assert!(service.cancel_appointment(&patient, booked.id).await.is_ok());

        let as_doctor = service.caller_for(doctor.id).await.unwrap();
        let err = service.complete_appointment(&as_doctor, booked.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn only_the_attending_doctor_completes() {
        let service = ResourceService::new(Database::in_memory(), PolicyTable::default());
        let db = service.database();
        let doctor = service.caller_for(account(db, "doc", Role::Doctor).await.id).await.unwrap();
        let patient = service.caller_for(account(db, "pat", Role::Patient).await.id).await.unwrap();
        let booked = service
            .create(&patient, Appointment::new(patient.id, doctor.id, day(14), "10:00"))
            .await
            .unwrap();

        let err = service.complete_appointment(&patient, booked.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(err.to_string(), "Permission denied: only the attending doctor can complete appointment");
        let stored: Appointment = service.get(&patient, booked.id).await.unwrap();
        assert_eq!(stored.status, AppointmentStatus::Scheduled);

        let done = service.complete_appointment(&doctor, booked.id).await.unwrap();
        assert_eq!(done.status, AppointmentStatus::Completed);
    }

    #[tokio::test]
    async fn strangers_cannot_cancel() {
        let service = ResourceService::new(Database::in_memory(), PolicyTable::default());
        let db = service.database();
        let doctor = account(db, "doc", Role::Doctor).await;
        let patient = account(db, "pat", Role::Patient).await;
        let stranger = service.caller_for(account(db, "eve", Role::Patient).await.id).await.unwrap();
        let booked = db.insert(Appointment::new(patient.id, doctor.id, day(12), "16:45")).await.unwrap();

        let err = service.cancel_appointment(&stranger, booked.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(service.complete_appointment(&stranger, 404).await.unwrap_err().kind(), ErrorKind::NotFound);
    }
}
