// server/src/cli/handlers.rs

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use lib::{
    mailer_from_config, AssistService, Caller, ClinicConfig, Database, Extraction, ExtractionService,
    HostedTextGenerator, HttpTextExtractor, NotificationService, Operation, PolicyTable, ResourceService, Scope,
};
use models::{
    Account, Appointment, ChatMessage, Diagnosis, DoctorProfile, Document, Entity, Lab, LabEquipment, LabReport,
    LabTechnicianProfile, LabTest, NewAccount, NutritionalPlan, PatientRecord, Prescription, RecordId, RecordPatch,
    ResourceKind, Role,
};
use serde_json::{json, Value};

use crate::cli::commands::ClinicCommands;

/// Everything a command needs: configuration plus the record service.
pub struct ClinicContext {
    config: ClinicConfig,
    resources: ResourceService,
}

impl ClinicContext {
    pub fn new(config: ClinicConfig, db: Database, policy: PolicyTable) -> Self {
        ClinicContext {
            config,
            resources: ResourceService::new(db, policy),
        }
    }

    async fn caller(&self, acting_as: Option<RecordId>) -> Result<Caller> {
        let id = acting_as.ok_or_else(|| anyhow!("this command needs --as <ACCOUNT_ID>"))?;
        Ok(self.resources.caller_for(id).await?)
    }
}

fn account_summary(account: &Account) -> Value {
    json!({
        "id": account.id,
        "username": account.username,
        "email": account.email,
        "full_name": account.full_name,
        "role": account.role,
    })
}

fn new_account(username: String, email: String, password: String, full_name: String, role: Role) -> NewAccount {
    NewAccount {
        username,
        email,
        password,
        full_name,
        role,
        date_of_birth: None,
        phone_number: None,
        address: None,
    }
}

/// Runs one command and returns what it produced as JSON.
pub async fn execute(context: &ClinicContext, acting_as: Option<RecordId>, command: ClinicCommands) -> Result<Value> {
    let resources = &context.resources;
    match command {
        ClinicCommands::BootstrapAdmin { username, email, password, full_name } => {
            let account = resources
                .bootstrap_admin(new_account(username, email, password, full_name, Role::Admin))
                .await?;
            Ok(account_summary(&account))
        }
        ClinicCommands::Register { username, email, password, full_name, role } => {
            let account = resources
                .register_account(new_account(username, email, password, full_name, role))
                .await?;
            Ok(account_summary(&account))
        }
        ClinicCommands::Whoami => {
            let caller = context.caller(acting_as).await?;
            let account: Account = resources.get(&caller, caller.id).await?;
            Ok(account_summary(&account))
        }
        ClinicCommands::Stats => {
            let caller = context.caller(acting_as).await?;
            Ok(serde_json::to_value(resources.system_stats(&caller).await?)?)
        }
        ClinicCommands::Doctors { doctor_id } => {
            let caller = context.caller(acting_as).await?;
            match doctor_id {
                Some(id) => Ok(serde_json::to_value(resources.get_doctor(&caller, id).await?)?),
                None => Ok(serde_json::to_value(resources.list_doctors(&caller).await?)?),
            }
        }
        ClinicCommands::Promote { account_id, specialization, license_number } => {
            let caller = context.caller(acting_as).await?;
            let profile = resources
                .promote_to_doctor(&caller, account_id, &specialization, &license_number)
                .await?;
            Ok(serde_json::to_value(profile)?)
        }
        ClinicCommands::SendReminders { date } => {
            let caller = context.caller(acting_as).await?;
            let notifications = NotificationService::new(resources.clone(), mailer_from_config(&context.config.email));
            let today = date.unwrap_or_else(|| Utc::now().date_naive());
            let sent = notifications.schedule_medication_reminders(&caller, today).await?;
            Ok(json!({ "date": today, "sent": sent }))
        }
        ClinicCommands::Chat { message } => {
            let caller = context.caller(acting_as).await?;
            let generator = HostedTextGenerator::new(&context.config.text_generation);
            let assist = AssistService::new(resources.clone(), Arc::new(generator));
            Ok(serde_json::to_value(assist.chat(&caller, caller.id, &message).await?)?)
        }
        ClinicCommands::Extract { document_id, file } => {
            let caller = context.caller(acting_as).await?;
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {:?}", file))?;
            let extractor = HttpTextExtractor::new(&context.config.extraction);
            let extraction = ExtractionService::new(resources.clone(), Arc::new(extractor))
                .extract_document_text(&caller, document_id, bytes)
                .await?;
            Ok(match extraction {
                Extraction::Text(text) => json!({ "extracted_text": text }),
                Extraction::Unsupported => json!({ "error": "Unsupported file format" }),
            })
        }
        ClinicCommands::Record { kind, operation, id, data, scope } => {
            let caller = context.caller(acting_as).await?;
            let data = data
                .map(|text| serde_json::from_str::<Value>(&text))
                .transpose()
                .context("--data is not valid JSON")?;
            let request = RecordRequest { operation, id, data, scope };
            let output = match kind {
                ResourceKind::Account => record_command::<Account>(resources, &caller, request).await?,
                ResourceKind::Patient => record_command::<PatientRecord>(resources, &caller, request).await?,
                ResourceKind::DoctorProfile => record_command::<DoctorProfile>(resources, &caller, request).await?,
                ResourceKind::LabTechnicianProfile => {
                    record_command::<LabTechnicianProfile>(resources, &caller, request).await?
                }
                ResourceKind::Lab => record_command::<Lab>(resources, &caller, request).await?,
                ResourceKind::Appointment => record_command::<Appointment>(resources, &caller, request).await?,
                ResourceKind::Diagnosis => record_command::<Diagnosis>(resources, &caller, request).await?,
                ResourceKind::Prescription => record_command::<Prescription>(resources, &caller, request).await?,
                ResourceKind::LabTest => record_command::<LabTest>(resources, &caller, request).await?,
                ResourceKind::LabReport => record_command::<LabReport>(resources, &caller, request).await?,
                ResourceKind::LabEquipment => record_command::<LabEquipment>(resources, &caller, request).await?,
                ResourceKind::NutritionalPlan => record_command::<NutritionalPlan>(resources, &caller, request).await?,
                ResourceKind::Document => record_command::<Document>(resources, &caller, request).await?,
                ResourceKind::ChatMessage => record_command::<ChatMessage>(resources, &caller, request).await?,
            };
            Ok(without_secrets(output))
        }
        ClinicCommands::Policy { kind } => Ok(policy_listing(resources.policy(), kind)),
    }
}

/// Arguments of `record`, with `--data` already parsed.
struct RecordRequest {
    operation: Operation,
    id: Option<RecordId>,
    data: Option<Value>,
    scope: Scope,
}

async fn record_command<E: Entity>(resources: &ResourceService, caller: &Caller, request: RecordRequest) -> Result<Value> {
    let RecordRequest { operation, id, data, scope } = request;
    let id = || id.ok_or_else(|| anyhow!("{} {} needs --id", operation, E::KIND));
    let data = || data.clone().ok_or_else(|| anyhow!("{} {} needs --data", operation, E::KIND));
    match operation {
        Operation::Create => {
            if E::KIND == ResourceKind::Account {
                bail!("accounts are created with register or bootstrap-admin");
            }
            let record: E = serde_json::from_value(new_record(data()?)?)
                .with_context(|| format!("--data does not describe a {}", E::KIND))?;
            Ok(serde_json::to_value(resources.create(caller, record).await?)?)
        }
        Operation::Read => Ok(serde_json::to_value(resources.get::<E>(caller, id()?).await?)?),
        Operation::List => Ok(serde_json::to_value(resources.list::<E>(caller, scope).await?)?),
        Operation::Update => {
            let patch: RecordPatch =
                serde_json::from_value(data()?).context("--data must be a JSON object of fields to change")?;
            Ok(serde_json::to_value(resources.update::<E>(caller, id()?, &patch).await?)?)
        }
        Operation::Delete => {
            let id = id()?;
            resources.delete::<E>(caller, id).await?;
            Ok(json!({ "kind": E::KIND.to_string(), "deleted": id }))
        }
    }
}

/// Fills the fields the store assigns so `--data` only needs the content.
fn new_record(data: Value) -> Result<Value> {
    let Value::Object(mut fields) = data else {
        bail!("--data must be a JSON object");
    };
    let now = json!(Utc::now());
    fields.entry("id").or_insert(json!(0));
    fields.entry("created_at").or_insert_with(|| now.clone());
    fields.entry("updated_at").or_insert(now);
    Ok(Value::Object(fields))
}

fn without_secrets(mut output: Value) -> Value {
    match &mut output {
        Value::Object(fields) => {
            fields.remove("password_hash");
        }
        Value::Array(items) => items.iter_mut().for_each(|item| {
            if let Value::Object(fields) = item {
                fields.remove("password_hash");
            }
        }),
        _ => {}
    }
    output
}

fn policy_listing(policy: &PolicyTable, kind: Option<ResourceKind>) -> Value {
    let rules: Vec<Value> = policy
        .entries()
        .filter(|(k, _, _)| kind.is_none_or(|wanted| wanted == *k))
        .map(|(k, op, rule)| json!({ "kind": k.to_string(), "operation": op.to_string(), "rule": rule.to_string() }))
        .collect();
    json!({ "admin": "always allowed", "rules": rules })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ClinicContext {
        ClinicContext::new(ClinicConfig::default(), Database::in_memory(), PolicyTable::default())
    }

    async fn bootstrap(context: &ClinicContext) -> RecordId {
        let admin = execute(
            context,
            None,
            ClinicCommands::BootstrapAdmin {
                username: "root".to_string(),
                email: "root@clinic.test".to_string(),
                password: "correct horse".to_string(),
                full_name: "Root".to_string(),
            },
        )
        .await
        .unwrap();
        admin["id"].as_u64().unwrap()
    }

    #[tokio::test]
    async fn admin_bootstrap_then_promotion() {
        let context = context();
        let admin_id = bootstrap(&context).await;

        let who = execute(&context, Some(admin_id), ClinicCommands::Whoami).await.unwrap();
        assert_eq!(who["role"], "admin");
        assert!(who.get("password_hash").is_none());

        let registered = execute(
            &context,
            None,
            ClinicCommands::Register {
                username: "house".to_string(),
                email: "house@clinic.test".to_string(),
                password: "vicodin123".to_string(),
                full_name: "Gregory House".to_string(),
                role: Role::Patient,
            },
        )
        .await
        .unwrap();
        let house = registered["id"].as_u64().unwrap();

        let promote = ClinicCommands::Promote {
            account_id: house,
            specialization: "diagnostics".to_string(),
            license_number: "LIC-42".to_string(),
        };
        execute(&context, Some(admin_id), promote).await.unwrap();

        let doctors = execute(&context, Some(house), ClinicCommands::Doctors { doctor_id: None }).await.unwrap();
        assert_eq!(doctors[0]["specialization"], "diagnostics");
        let stats = execute(&context, Some(admin_id), ClinicCommands::Stats).await.unwrap();
        assert_eq!(stats["total_doctors"], 1);
        assert_eq!(stats["total_users"], 2);
    }

    #[tokio::test]
    async fn commands_need_an_acting_account() {
        let context = context();
        let admin_id = bootstrap(&context).await;
        assert!(execute(&context, None, ClinicCommands::Stats).await.is_err());
        assert!(execute(&context, Some(admin_id + 100), ClinicCommands::Whoami).await.is_err());

        let sent = execute(&context, Some(admin_id), ClinicCommands::SendReminders { date: None })
            .await
            .unwrap();
        assert_eq!(sent["sent"], 0);
    }

    async fn register(context: &ClinicContext, username: &str) -> RecordId {
        let registered = execute(
            context,
            None,
            ClinicCommands::Register {
                username: username.to_string(),
                email: format!("{}@clinic.test", username),
                password: "s3cure-enough".to_string(),
                full_name: username.to_string(),
                role: Role::Patient,
            },
        )
        .await
        .unwrap();
        registered["id"].as_u64().unwrap()
    }

    fn record(kind: ResourceKind, operation: Operation, id: Option<RecordId>, data: Option<Value>) -> ClinicCommands {
        ClinicCommands::Record {
            kind,
            operation,
            id,
            data: data.map(|value| value.to_string()),
            scope: Scope::All,
        }
    }

    #[tokio::test]
    async fn records_are_managed_through_the_permission_table() {
        let context = context();
        let admin = bootstrap(&context).await;
        let doctor = register(&context, "grey").await;
        let patient = register(&context, "pat").await;
        let stranger = register(&context, "eve").await;
        let promote = ClinicCommands::Promote {
            account_id: doctor,
            specialization: "general".to_string(),
            license_number: "LIC-7".to_string(),
        };
        execute(&context, Some(admin), promote).await.unwrap();

        let data = json!({ "patient_id": patient, "doctor_id": doctor, "diagnosis": "flu", "date": "2024-06-03" });
        let create = record(ResourceKind::Diagnosis, Operation::Create, None, Some(data));
        let err = execute(&context, Some(patient), create.clone()).await.unwrap_err();
        assert!(err.to_string().contains("Permission denied"), "{err}");
        let created = execute(&context, Some(doctor), create).await.unwrap();
        let id = created["id"].as_u64().unwrap();
        assert!(id > 0);

        let notes = json!({ "notes": "rest and fluids" });
        let update = record(ResourceKind::Diagnosis, Operation::Update, Some(id), Some(notes));
        let updated = execute(&context, Some(doctor), update).await.unwrap();
        assert_eq!(updated["notes"], "rest and fluids");

        let get = record(ResourceKind::Diagnosis, Operation::Read, Some(id), None);
        assert_eq!(execute(&context, Some(patient), get.clone()).await.unwrap()["diagnosis"], "flu");
        assert!(execute(&context, Some(stranger), get).await.is_err());

        let own = ClinicCommands::Record {
            kind: ResourceKind::Diagnosis,
            operation: Operation::List,
            id: None,
            data: None,
            scope: Scope::Account(patient),
        };
        assert_eq!(execute(&context, Some(patient), own).await.unwrap().as_array().unwrap().len(), 1);
        let everyone = record(ResourceKind::Diagnosis, Operation::List, None, None);
        assert!(execute(&context, Some(patient), everyone).await.is_err());

        let delete = record(ResourceKind::Diagnosis, Operation::Delete, Some(id), None);
        assert_eq!(execute(&context, Some(doctor), delete).await.unwrap()["deleted"], id);
    }

    #[tokio::test]
    async fn record_output_never_carries_password_hashes() {
        let context = context();
        let admin = bootstrap(&context).await;
        let me = record(ResourceKind::Account, Operation::Read, Some(admin), None);
        let shown = execute(&context, Some(admin), me).await.unwrap();
        assert_eq!(shown["username"], "root");
        assert!(shown.get("password_hash").is_none());
        let listed = execute(&context, Some(admin), record(ResourceKind::Account, Operation::List, None, None))
            .await
            .unwrap();
        assert!(listed.as_array().unwrap().iter().all(|account| account.get("password_hash").is_none()));

        let create = record(ResourceKind::Account, Operation::Create, None, Some(json!({ "username": "x" })));
        assert!(execute(&context, Some(admin), create).await.is_err());
        let missing_id = record(ResourceKind::Account, Operation::Delete, None, None);
        let err = execute(&context, Some(admin), missing_id).await.unwrap_err();
        assert!(err.to_string().contains("needs --id"), "{err}");
    }

    #[tokio::test]
    async fn policy_listing_can_be_narrowed() {
        let context = context();
        let all = execute(&context, None, ClinicCommands::Policy { kind: None }).await.unwrap();
        let narrowed = execute(&context, None, ClinicCommands::Policy { kind: Some(ResourceKind::Document) })
            .await
            .unwrap();
        let narrowed = narrowed["rules"].as_array().unwrap();
        assert!(all["rules"].as_array().unwrap().len() > narrowed.len());
        assert!(narrowed.iter().all(|entry| entry["kind"] == "document" && entry["rule"] == "owner"));
    }
}
