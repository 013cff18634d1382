// lib/src/accounts.rs
// Registration, sign-in and the administrator's account operations.

use chrono::Utc;
use log::{info, warn};
use models::errors::require_text;
use models::{
    Account, ClinicError, ClinicResult, DoctorProfile, Entity, NewAccount, Prescription, RecordId, ResourceKind, Role,
    ValidationError,
};
use security::{classify, Caller, Operation};
use serde::{Deserialize, Serialize};

use crate::service::ResourceService;

/// A doctor as shown to other accounts: identity plus professional profile,
/// never the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorListing {
    pub id: RecordId,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub specialization: Option<String>,
    pub license_number: Option<String>,
    pub years_of_experience: Option<u32>,
}

impl DoctorListing {
    fn new(account: Account, profile: Option<DoctorProfile>) -> Self {
        DoctorListing {
            id: account.id,
            username: account.username,
            full_name: account.full_name,
            email: account.email,
            phone_number: account.phone_number,
            specialization: profile.as_ref().map(|p| p.specialization.clone()),
            license_number: profile.as_ref().map(|p| p.license_number.clone()),
            years_of_experience: profile.and_then(|p| p.years_of_experience),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_users: usize,
    pub total_patients: usize,
    pub total_doctors: usize,
    pub total_prescriptions: usize,
}

impl ResourceService {
    /// Public sign-up. Administrators cannot register themselves.
    pub async fn register_account(&self, new_account: NewAccount) -> ClinicResult<Account> {
        if new_account.role == Role::Admin {
            warn!("Refused self-registration of admin account {:?}", new_account.username);
            return Err(ClinicError::Authorization(
                "admin accounts cannot be self-registered".to_string(),
            ));
        }
        self.insert_account(new_account).await
    }

    /// Creates the first administrator. Refused once any admin exists.
    pub async fn bootstrap_admin(&self, mut new_account: NewAccount) -> ClinicResult<Account> {
        let admins = self.database().count(|a: &Account| a.has_role(Role::Admin)).await?;
        if admins > 0 {
            return Err(ClinicError::Authorization("an admin account already exists".to_string()));
        }
        new_account.role = Role::Admin;
        self.insert_account(new_account).await
    }

    async fn insert_account(&self, new_account: NewAccount) -> ClinicResult<Account> {
        new_account.validate()?;
        let account = Account::from_new_account(new_account)?;
        account.validate()?;
        self.check_unique(&account, None).await?;
        let stored = self.database().insert(account).await?;
        info!("Registered account {} ({}) as {}", stored.id, stored.username, stored.role);
        Ok(stored)
    }

    /// Checks credentials. Unknown email and wrong password fail alike.
    pub async fn sign_in(&self, email: &str, password: &str) -> ClinicResult<Account> {
        let invalid = || ClinicError::Authorization("invalid credentials".to_string());
        let account = self
            .database()
            .first(|a: &Account| a.email.eq_ignore_ascii_case(email))
            .await?
            .ok_or_else(invalid)?;
        match Account::verify_password(password, &account.password_hash) {
            Ok(true) => Ok(account),
            Ok(false) => Err(invalid()),
            Err(e) => {
                warn!("Stored password hash for account {} is unreadable: {}", account.id, e);
                Err(invalid())
            }
        }
    }

    /// Every doctor account, open to any authenticated caller.
    pub async fn list_doctors(&self, caller: &Caller) -> ClinicResult<Vec<DoctorListing>> {
        self.authorize(caller, Operation::List, ResourceKind::DoctorProfile, None)?;
        let db = self.database();
        let doctors = db.find(|a: &Account| a.has_role(Role::Doctor)).await?;
        let profiles: Vec<DoctorProfile> = db.all().await?;
        Ok(doctors
            .into_iter()
            .map(|account| {
                let profile = profiles.iter().find(|p| p.account_id == account.id).cloned();
                DoctorListing::new(account, profile)
            })
            .collect())
    }

    pub async fn get_doctor(&self, caller: &Caller, doctor_id: RecordId) -> ClinicResult<DoctorListing> {
        let account = match self.database().fetch::<Account>(doctor_id).await? {
            Some(account) if account.has_role(Role::Doctor) => account,
            _ => return Err(ClinicError::not_found(ResourceKind::DoctorProfile, doctor_id)),
        };
        let profile = self
            .database()
            .first(|p: &DoctorProfile| p.account_id == doctor_id)
            .await?;
        let ownership = profile.as_ref().map(|p| p.ownership());
        self.authorize(caller, Operation::Read, ResourceKind::DoctorProfile, ownership.as_ref())?;
        Ok(DoctorListing::new(account, profile))
    }

    /// Turns an account into a doctor. Both professional fields are required
    /// and license numbers are unique.
    pub async fn promote_to_doctor(
        &self,
        caller: &Caller,
        account_id: RecordId,
        specialization: &str,
        license_number: &str,
    ) -> ClinicResult<DoctorProfile> {
        self.authorize(caller, Operation::Create, ResourceKind::DoctorProfile, None)?;
        require_text("specialization", specialization)?;
        require_text("license_number", license_number)?;

        let db = self.database();
        let mut account: Account = db
            .fetch(account_id)
            .await?
            .ok_or_else(|| ClinicError::not_found(ResourceKind::Account, account_id))?;
        if db.first(|p: &DoctorProfile| p.account_id == account_id).await?.is_some() {
            return Err(ValidationError::invalid("account_id", "account already has a doctor profile").into());
        }

        let profile = DoctorProfile::new(account_id, specialization, license_number);
        profile.validate()?;
        self.check_unique(&profile, None).await?;
        account.role = Role::Doctor.to_string();
        account.touch(Utc::now());
        db.save(&account).await?;
        let profile = db.insert(profile).await?;
        info!("Account {} promoted account {} to doctor", caller.id, account_id);
        Ok(profile)
    }

    pub async fn system_stats(&self, caller: &Caller) -> ClinicResult<SystemStats> {
        if classify(caller)? != Role::Admin {
            warn!("Account {} asked for system statistics", caller.id);
            return Err(ClinicError::Authorization("not authorized to view system statistics".to_string()));
        }
        let db = self.database();
        Ok(SystemStats {
            total_users: db.count(|_: &Account| true).await?,
            total_patients: db.count(|a: &Account| a.has_role(Role::Patient)).await?,
            total_doctors: db.count(|a: &Account| a.has_role(Role::Doctor)).await?,
            total_prescriptions: db.count(|_: &Prescription| true).await?,
        })
    }
}
