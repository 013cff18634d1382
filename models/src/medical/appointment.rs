// models/src/medical/appointment.rs

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{ValidationError, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// `scheduled -> completed | cancelled`; terminal states stay put.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        *self == next || (*self == AppointmentStatus::Scheduled && next.is_terminal())
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A visit booked by a patient account with a doctor account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordId,
    pub account_id: RecordId,
    pub doctor_id: RecordId,
    pub date: NaiveDate,
    pub time: String, // "HH:MM"
    #[serde(default)]
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn new(account_id: RecordId, doctor_id: RecordId, date: NaiveDate, time: &str) -> Self {
        let now = Utc::now();
        Appointment {
            id: 0,
            account_id,
            doctor_id,
            date,
            time: time.to_string(),
            status: AppointmentStatus::Scheduled,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Entity for Appointment {
    const KIND: ResourceKind = ResourceKind::Appointment;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Shared { patient: self.account_id, doctor: self.doctor_id }
    }

    fn validate(&self) -> ValidationResult<()> {
        if self.time.len() != 5 || NaiveTime::parse_from_str(&self.time, "%H:%M").is_err() {
            return Err(ValidationError::invalid("time", "expected HH:MM"));
        }
        Ok(())
    }

    fn doctor_reference(&self) -> Option<RecordId> {
        Some(self.doctor_id)
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "account_id", "created_at", "updated_at"]
    }

    fn check_create(&self) -> ValidationResult<()> {
        if self.status != AppointmentStatus::Scheduled {
            return Err(ValidationError::invalid("status", "appointments are booked as scheduled"));
        }
        Ok(())
    }

    fn check_update(&self, previous: &Self) -> ValidationResult<()> {
        if !previous.status.can_transition_to(self.status) {
            return Err(ValidationError::InvalidTransition {
                from: previous.status.to_string(),
                to: self.status.to_string(),
            });
        }
        Ok(())
    }

    fn needs_attending_doctor(&self, previous: &Self) -> bool {
        self.status == AppointmentStatus::Completed && previous.status != AppointmentStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment() -> Appointment {
        Appointment::new(7, 2, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap(), "09:30")
    }

    #[test]
    fn completing_is_left_to_the_doctor() {
        let scheduled = appointment();
        let completed = Appointment { status: AppointmentStatus::Completed, ..scheduled.clone() };
        let cancelled = Appointment { status: AppointmentStatus::Cancelled, ..scheduled.clone() };
        assert!(completed.needs_attending_doctor(&scheduled));
        assert!(!cancelled.needs_attending_doctor(&scheduled));
        assert!(!scheduled.needs_attending_doctor(&scheduled));
    }

    #[test]
    fn scheduled_moves_to_either_terminal_state() {
        let scheduled = AppointmentStatus::Scheduled;
        assert!(scheduled.can_transition_to(AppointmentStatus::Completed));
        assert!(scheduled.can_transition_to(AppointmentStatus::Cancelled));
    }

    #[test]
    fn terminal_states_are_final() {
        let previous = Appointment { status: AppointmentStatus::Cancelled, ..appointment() };
        let reopened = Appointment { status: AppointmentStatus::Scheduled, ..appointment() };
        assert_eq!(
            reopened.check_update(&previous),
            Err(ValidationError::InvalidTransition {
                from: "cancelled".to_string(),
                to: "scheduled".to_string(),
            })
        );
        let completed = Appointment { status: AppointmentStatus::Completed, ..appointment() };
        assert!(completed.check_update(&previous).is_err());
    }

    #[test]
    fn rewriting_the_same_status_is_allowed() {
        let done = Appointment { status: AppointmentStatus::Completed, ..appointment() };
        assert!(done.check_update(&done.clone()).is_ok());
    }

    #[test]
    fn bookings_start_scheduled() {
        assert!(appointment().check_create().is_ok());
        let done = Appointment { status: AppointmentStatus::Completed, ..appointment() };
        assert!(done.check_create().is_err());
    }

    #[test]
    fn time_must_be_hours_and_minutes() {
        assert!(appointment().validate().is_ok());
        assert!(Appointment { time: "9:30".to_string(), ..appointment() }.validate().is_err());
        assert!(Appointment { time: "25:00".to_string(), ..appointment() }.validate().is_err());
    }

    #[test]
    fn both_patient_and_doctor_share_the_appointment() {
        assert_eq!(appointment().ownership(), Ownership::Shared { patient: 7, doctor: 2 });
    }
}
