// lib/src/assist/diet.rs

use chrono::Utc;
use log::{info, warn};
use models::{
    Account, ClinicError, ClinicResult, NutritionalPlan, Ownership, RecordId, ResourceKind, Role,
};
use security::{Caller, Operation, Scope};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::llm::{CompletionRequest, PromptMessage};
use super::AssistService;

/// What the generator is told about the patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DietPlanRequest {
    pub patient_id: RecordId,
    pub age: u32,
    pub weight: f64,
    #[serde(default)]
    pub existing_health_conditions: Vec<String>,
    pub goal: String,
    pub dietary_preferences: String,
    #[serde(default)]
    pub food_allergies_intolerances: Vec<String>,
    pub physical_activity_level: String,
}

impl DietPlanRequest {
    fn prompt(&self) -> ClinicResult<String> {
        Ok(format!(
            "Generate a diet plan based on the following information: {}\n\n\
             Generate diet plans based on health status, goals, and preferences and predict the impact \
             of dietary changes on health outcomes. Return the response in a JSON format.",
            serde_json::to_string(self)?
        ))
    }

    fn summary(&self) -> String {
        format!(
            "Generated based on patient data: Age {}, Weight {}, Activity Level {}",
            self.age, self.weight, self.physical_activity_level
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDietPlan {
    pub plan: NutritionalPlan,
    pub diet_plan: Value,
}

impl AssistService {
    /// Asks the generator for a plan and stores it for the patient.
    ///
    /// The patient must exist and the caller must be allowed to create a
    /// plan for them before the generator is contacted.
    pub async fn generate_diet_plan(&self, caller: &Caller, request: DietPlanRequest) -> ClinicResult<GeneratedDietPlan> {
        let patient_id = request.patient_id;
        self.resources
            .database()
            .fetch::<Account>(patient_id)
            .await?
            .ok_or_else(|| ClinicError::not_found(ResourceKind::Account, patient_id))?;
        let role = self.resources.authorize(
            caller,
            Operation::Create,
            ResourceKind::NutritionalPlan,
            Some(&Ownership::Account(patient_id)),
        )?;

        let completion = CompletionRequest {
            messages: vec![PromptMessage::user(request.prompt()?)],
            temperature: 1.0,
            max_tokens: 1024,
            top_p: 1.0,
            json_response: true,
        };
        let reply = self.generator.generate(completion).await?;
        let diet_plan: Value = serde_json::from_str(&reply).map_err(|e| {
            warn!("Diet plan reply for patient {} is not JSON: {}", patient_id, e);
            ClinicError::external("text-generation", format!("diet plan reply is not valid JSON: {}", e))
        })?;

        let mut plan = NutritionalPlan::new(patient_id, &diet_plan.to_string(), Utc::now().date_naive());
        plan.goals = Some(request.goal.clone());
        plan.notes = Some(request.summary());
        if role == Role::Doctor {
            plan.doctor_id = Some(caller.id);
        }
        let plan = self.resources.create(caller, plan).await?;
        info!("Generated diet plan {} for patient {}", plan.id, patient_id);
        Ok(GeneratedDietPlan { plan, diet_plan })
    }

    /// All plans of one patient. Having none is reported as `NotFound`.
    pub async fn diet_plans_for_patient(&self, caller: &Caller, patient_id: RecordId) -> ClinicResult<Vec<NutritionalPlan>> {
        let plans: Vec<NutritionalPlan> = self.resources.list(caller, Scope::Account(patient_id)).await?;
        if plans.is_empty() {
            return Err(ClinicError::not_found(ResourceKind::NutritionalPlan, patient_id));
        }
        Ok(plans)
    }

    pub async fn diet_plan(&self, caller: &Caller, plan_id: RecordId) -> ClinicResult<NutritionalPlan> {
        self.resources.get(caller, plan_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assist::llm::MockTextGenerator;
    use crate::database::Database;
    use crate::service::tests::account;
    use crate::service::ResourceService;
    use models::ErrorKind;
    use security::PolicyTable;

    fn request(patient_id: RecordId) -> DietPlanRequest {
        DietPlanRequest {
            patient_id,
            age: 34,
            weight: 71.5,
            existing_health_conditions: vec!["hypertension".to_string()],
            goal: "lower blood pressure".to_string(),
            dietary_preferences: "vegetarian".to_string(),
            food_allergies_intolerances: vec![],
            physical_activity_level: "moderate".to_string(),
        }
    }

    fn assist(db: &Database, generator: MockTextGenerator) -> AssistService {
        AssistService::new(ResourceService::new(db.clone(), PolicyTable::default()), Arc::new(generator))
    }

    #[tokio::test]
    async fn doctor_generates_and_signs_a_plan() {
        let db = Database::in_memory();
        let doctor = account(&db, "doc", Role::Doctor).await;
        let patient = account(&db, "pat", Role::Patient).await;

        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|req| {
                req.json_response
                    && req.max_tokens == 1024
                    && req.messages.len() == 1
                    && req.messages[0].content.contains("\"goal\":\"lower blood pressure\"")
            })
            .times(1)
            .returning(|_| Ok(r#"{"breakfast":"oats","lunch":"lentils"}"#.to_string()));
        let assist = assist(&db, generator);
        let caller = assist.resources().caller_for(doctor.id).await.unwrap();

        let generated = assist.generate_diet_plan(&caller, request(patient.id)).await.unwrap();
        assert_eq!(generated.diet_plan["breakfast"], "oats");
        assert_eq!(generated.plan.doctor_id, Some(doctor.id));
        assert_eq!(generated.plan.goals.as_deref(), Some("lower blood pressure"));
        assert_eq!(
            generated.plan.notes.as_deref(),
            Some("Generated based on patient data: Age 34, Weight 71.5, Activity Level moderate")
        );
        assert_eq!(generated.plan.details_json(), generated.diet_plan);

        let plans = assist.diet_plans_for_patient(&caller, patient.id).await.unwrap();
        assert_eq!(plans.len(), 1);
    }

    #[tokio::test]
    async fn patients_get_unsigned_plans_for_themselves_only() {
        let db = Database::in_memory();
        let patient = account(&db, "pat", Role::Patient).await;
        let other = account(&db, "eve", Role::Patient).await;

        let mut generator = MockTextGenerator::new();
        generator.expect_generate().times(1).returning(|_| Ok("{}".to_string()));
        let assist = assist(&db, generator);
        let caller = assist.resources().caller_for(patient.id).await.unwrap();

        let own = assist.generate_diet_plan(&caller, request(patient.id)).await.unwrap();
        assert_eq!(own.plan.doctor_id, None);

        let err = assist.generate_diet_plan(&caller, request(other.id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn unknown_patient_never_reaches_the_generator() {
        let db = Database::in_memory();
        let doctor = account(&db, "doc", Role::Doctor).await;
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().never();
        let assist = assist(&db, generator);
        let caller = assist.resources().caller_for(doctor.id).await.unwrap();

        let err = assist.generate_diet_plan(&caller, request(999)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn non_json_reply_is_not_stored() {
        let db = Database::in_memory();
        let doctor = account(&db, "doc", Role::Doctor).await;
        let patient = account(&db, "pat", Role::Patient).await;
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|_| Ok("eat more greens".to_string()));
        let assist = assist(&db, generator);
        let caller = assist.resources().caller_for(doctor.id).await.unwrap();

        let err = assist.generate_diet_plan(&caller, request(patient.id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalService);
        let err = assist.diet_plans_for_patient(&caller, patient.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn generator_failures_pass_through() {
        let db = Database::in_memory();
        let patient = account(&db, "pat", Role::Patient).await;
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(ClinicError::external("text-generation", "HTTP 503")));
        let assist = assist(&db, generator);
        let caller = assist.resources().caller_for(patient.id).await.unwrap();

        let err = assist.generate_diet_plan(&caller, request(patient.id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalService);
    }
}
