// lib/src/service.rs

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use models::{
    Account, ClinicError, ClinicResult, Entity, LabTechnicianProfile, Ownership, RecordId, RecordPatch, ResourceKind,
    Role, ValidationError,
};
use security::{classify, is_owner, is_subject, scope_owned_by, Caller, Decision, Operation, PolicyTable, Scope};

use crate::database::Database;

/// Create/read/list/update/delete over every record kind, each call gated by
/// the permission table.
///
/// Ownership is decided on the stored record, so every operation on an
/// existing id fetches first and reports `NotFound` before any permission
/// check. Soft-deleted records count as absent.
#[derive(Debug, Clone)]
pub struct ResourceService {
    db: Database,
    policy: Arc<PolicyTable>,
}

impl ResourceService {
    pub fn new(db: Database, policy: PolicyTable) -> Self {
        ResourceService {
            db,
            policy: Arc::new(policy),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Resolves an account into the caller record used for decisions.
    pub async fn caller_for(&self, account_id: RecordId) -> ClinicResult<Caller> {
        let account: Account = self
            .db
            .fetch(account_id)
            .await?
            .ok_or_else(|| ClinicError::not_found(ResourceKind::Account, account_id))?;
        let mut caller = Caller::new(account.id, &account.role);
        if account.has_role(Role::LabTechnician) {
            let profiles: Vec<LabTechnicianProfile> =
                self.db.find(|p: &LabTechnicianProfile| p.account_id == account_id).await?;
            for profile in profiles {
                caller = caller.attached_to(profile.lab_id);
            }
        }
        Ok(caller)
    }

    /// Classifies the caller and checks `operation` against the table.
    ///
    /// A read by id treats the record's subject as an owner, the same way
    /// [`list`](Self::list) does for a caller's own scope.
    pub fn authorize(
        &self,
        caller: &Caller,
        operation: Operation,
        kind: ResourceKind,
        ownership: Option<&Ownership>,
    ) -> ClinicResult<Role> {
        let role = classify(caller)?;
        let owner = ownership
            .map(|o| is_owner(caller, role, o) || (operation == Operation::Read && is_subject(caller, o)))
            .unwrap_or(false);
        self.decide(caller, role, operation, kind, owner)?;
        Ok(role)
    }

    fn decide(&self, caller: &Caller, role: Role, operation: Operation, kind: ResourceKind, owner: bool) -> ClinicResult<()> {
        let decision = self.policy.authorize(role, operation, kind, owner);
        match &decision {
            Decision::Allow => debug!(
                "Allowed {} {} for account {} ({}, owner: {})",
                operation, kind, caller.id, role, owner
            ),
            Decision::Deny(reason) => warn!("Denied account {} ({}): {}", caller.id, role, reason),
        }
        decision.into_result()
    }

    /// Fetches a live record or fails with `NotFound`.
    pub(crate) async fn load<E: Entity>(&self, id: RecordId) -> ClinicResult<E> {
        match self.db.fetch::<E>(id).await? {
            Some(record) if !record.is_deleted() => Ok(record),
            _ => Err(ClinicError::not_found(E::KIND, id)),
        }
    }

    /// The record's doctor reference, if any, must name a doctor account.
    async fn check_doctor_reference<E: Entity>(&self, record: &E) -> ClinicResult<()> {
        let Some(doctor_id) = record.doctor_reference() else {
            return Ok(());
        };
        match self.db.fetch::<Account>(doctor_id).await? {
            Some(account) if account.has_role(Role::Doctor) => Ok(()),
            _ => Err(ValidationError::NotADoctor(doctor_id).into()),
        }
    }

    /// No other record of the kind may hold one of the record's unique
    /// values. Against `previous`, only values that changed are looked up.
    pub(crate) async fn check_unique<E: Entity>(&self, record: &E, previous: Option<&E>) -> ClinicResult<()> {
        let before = previous.map(|p| p.unique_keys()).unwrap_or_default();
        let changed: Vec<(&'static str, String)> = record
            .unique_keys()
            .into_iter()
            .filter(|key| !before.contains(key))
            .collect();
        if changed.is_empty() {
            return Ok(());
        }
        let id = record.id();
        let others = self.db.find(|other: &E| other.id() != id).await?;
        for (field, value) in changed {
            if others.iter().any(|other| other.unique_keys().contains(&(field, value.clone()))) {
                return Err(ValidationError::Duplicate {
                    field: field.to_string(),
                    value,
                }
                .into());
            }
        }
        Ok(())
    }

    pub async fn create<E: Entity>(&self, caller: &Caller, record: E) -> ClinicResult<E> {
        self.authorize(caller, Operation::Create, E::KIND, Some(&record.ownership()))?;
        record.check_create()?;
        record.validate()?;
        self.check_doctor_reference(&record).await?;
        self.check_unique(&record, None).await?;
        let stored = self.db.insert(record).await?;
        info!("Account {} created {} {}", caller.id, E::KIND, stored.id());
        Ok(stored)
    }

    pub async fn get<E: Entity>(&self, caller: &Caller, id: RecordId) -> ClinicResult<E> {
        let record = self.load::<E>(id).await?;
        self.authorize(caller, Operation::Read, E::KIND, Some(&record.ownership()))?;
        Ok(record)
    }

    /// Records of one kind within `scope`, soft-deleted ones excluded. The
    /// caller owns the listing when the scope is their own slice.
    pub async fn list<E: Entity>(&self, caller: &Caller, scope: Scope) -> ClinicResult<Vec<E>> {
        let role = classify(caller)?;
        let owner = scope_owned_by(caller, role, &scope);
        self.decide(caller, role, Operation::List, E::KIND, owner)?;
        self.db
            .find(|record: &E| !record.is_deleted() && scope.matches(&record.ownership()))
            .await
    }

    /// Partial update: only the fields present in `patch` change. An empty
    /// patch returns the stored record without writing.
    pub async fn update<E: Entity>(&self, caller: &Caller, id: RecordId, patch: &RecordPatch) -> ClinicResult<E> {
        let current = self.load::<E>(id).await?;
        let role = self.authorize(caller, Operation::Update, E::KIND, Some(&current.ownership()))?;
        if patch.is_empty() {
            return Ok(current);
        }
        let mut updated = patch.apply(&current)?;
        updated.check_update(&current)?;
        if updated.needs_attending_doctor(&current) {
            let attending = role == Role::Doctor && current.doctor_reference() == Some(caller.id);
            if !(attending || role == Role::Admin) {
                warn!("Denied account {} ({}): {} {} is left to its doctor", caller.id, role, E::KIND, id);
                return Err(ClinicError::Authorization(format!(
                    "only the attending doctor can complete {}",
                    E::KIND
                )));
            }
        }
        updated.validate()?;
        if updated.doctor_reference() != current.doctor_reference() {
            self.check_doctor_reference(&updated).await?;
        }
        self.check_unique(&updated, Some(&current)).await?;
        updated.touch(Utc::now());
        self.db.save(&updated).await?;
        info!(
            "Account {} updated {} {} ({})",
            caller.id,
            E::KIND,
            id,
            patch.fields().collect::<Vec<_>>().join(", ")
        );
        Ok(updated)
    }

    /// Hard delete, except for kinds that only ever mark themselves deleted.
    pub async fn delete<E: Entity>(&self, caller: &Caller, id: RecordId) -> ClinicResult<()> {
        let mut record = self.load::<E>(id).await?;
        self.authorize(caller, Operation::Delete, E::KIND, Some(&record.ownership()))?;
        if record.mark_deleted() {
            record.touch(Utc::now());
            self.db.save(&record).await?;
            info!("Account {} soft-deleted {} {}", caller.id, E::KIND, id);
        } else {
            self.db.remove::<E>(id).await?;
            info!("Account {} deleted {} {}", caller.id, E::KIND, id);
        }
        Ok(())
    }
}
