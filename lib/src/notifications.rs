// lib/src/notifications.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{info, warn};
use models::{Account, ClinicError, ClinicResult, Ownership, Prescription, RecordId, ResourceKind, Role};
use reqwest::Client;
use security::{classify, Caller, Operation};
use serde::{Deserialize, Serialize};

use crate::config::EmailConfig;
use crate::service::ResourceService;

const SERVICE: &str = "email";
const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, message: &EmailMessage) -> ClinicResult<()>;
}

/// Hands mail to an HTTP relay as `{from, to, subject, body}`.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    relay_url: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(relay_url: &str, sender: &str) -> Self {
        HttpMailer {
            client: Client::new(),
            relay_url: relay_url.to_string(),
            sender: sender.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> ClinicResult<()> {
        let payload = serde_json::json!({
            "from": self.sender,
            "to": message.to,
            "subject": message.subject,
            "body": message.body,
        });
        let request = self.client.post(&self.relay_url).json(&payload).send();
        let response = tokio::time::timeout(RELAY_TIMEOUT, request)
            .await
            .map_err(|_| ClinicError::external(SERVICE, "mail relay timed out"))?
            .map_err(|e| ClinicError::external(SERVICE, e.to_string()))?;
        if !response.status().is_success() {
            return Err(ClinicError::external(SERVICE, format!("mail relay answered {}", response.status())));
        }
        Ok(())
    }
}

/// Writes mail to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> ClinicResult<()> {
        info!("Mail to {}: {} | {}", message.to, message.subject, message.body);
        Ok(())
    }
}

pub fn mailer_from_config(config: &EmailConfig) -> Arc<dyn Mailer> {
    match &config.relay_url {
        Some(url) => Arc::new(HttpMailer::new(url, &config.sender)),
        None => Arc::new(LogMailer),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationReminder {
    pub patient_id: RecordId,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
}

impl MedicationReminder {
    pub fn for_prescription(prescription: &Prescription) -> Self {
        MedicationReminder {
            patient_id: prescription.patient_id,
            medication: prescription.medication.clone(),
            dosage: prescription.dosage.clone(),
            frequency: prescription.frequency.clone(),
        }
    }

    fn email(&self, to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            subject: "Medication Reminder".to_string(),
            body: format!(
                "Reminder: It's time to take your {}. Dosage: {}. Frequency: {}",
                self.medication, self.dosage, self.frequency
            ),
        }
    }
}

#[derive(Clone)]
pub struct NotificationService {
    resources: ResourceService,
    mailer: Arc<dyn Mailer>,
}

impl NotificationService {
    pub fn new(resources: ResourceService, mailer: Arc<dyn Mailer>) -> Self {
        NotificationService { resources, mailer }
    }

    /// Mails one reminder to the patient. Delivery failures are logged and
    /// reported as `Ok(false)`.
    ///
    /// Whoever may list the patient's prescriptions may remind them.
    pub async fn send_medication_reminder(&self, caller: &Caller, reminder: &MedicationReminder) -> ClinicResult<bool> {
        let patient: Account = self
            .resources
            .database()
            .fetch(reminder.patient_id)
            .await?
            .ok_or_else(|| ClinicError::not_found(ResourceKind::Account, reminder.patient_id))?;
        self.resources.authorize(
            caller,
            Operation::List,
            ResourceKind::Prescription,
            Some(&Ownership::Account(patient.id)),
        )?;
        Ok(self.deliver(&patient, reminder).await)
    }

    /// Reminds every patient with a prescription running on `today`.
    /// Returns how many reminders went out.
    pub async fn schedule_medication_reminders(&self, caller: &Caller, today: NaiveDate) -> ClinicResult<usize> {
        if classify(caller)? != Role::Admin {
            warn!("Account {} tried to schedule medication reminders", caller.id);
            return Err(ClinicError::Authorization(
                "only administrators may schedule reminders".to_string(),
            ));
        }

        let active: Vec<Prescription> = self
            .resources
            .database()
            .find(|p: &Prescription| p.is_active_on(today))
            .await?;
        let mut sent = 0;
        for prescription in &active {
            let Some(patient) = self.resources.database().fetch::<Account>(prescription.patient_id).await? else {
                continue;
            };
            if patient.email.trim().is_empty() {
                continue;
            }
            if self.deliver(&patient, &MedicationReminder::for_prescription(prescription)).await {
                sent += 1;
            }
        }
        info!("Sent {} of {} medication reminders for {}", sent, active.len(), today);
        Ok(sent)
    }

    async fn deliver(&self, patient: &Account, reminder: &MedicationReminder) -> bool {
        match self.mailer.send(&reminder.email(&patient.email)).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Medication reminder for account {} not delivered: {}", patient.id, e);
                false
            }
        }
    }
}
