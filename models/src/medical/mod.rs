// models/src/medical/mod.rs

pub mod account;
pub mod appointment;
pub mod chat;
pub mod diagnosis;
pub mod doctor;
pub mod document;
pub mod lab;
pub mod nutrition;
pub mod patient;
pub mod prescription;
pub mod role;

pub use account::{Account, NewAccount};
pub use appointment::{Appointment, AppointmentStatus};
pub use chat::ChatMessage;
pub use diagnosis::Diagnosis;
pub use doctor::DoctorProfile;
pub use document::Document;
pub use lab::{EquipmentStatus, Lab, LabEquipment, LabReport, LabTechnicianProfile, LabTest};
pub use nutrition::NutritionalPlan;
pub use patient::PatientRecord;
pub use prescription::Prescription;
pub use role::Role;
