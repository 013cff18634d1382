// models/src/medical/account.rs
// Accounts hold a bcrypt password hash, never the plaintext password.

use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Ownership};
use crate::errors::{require_text, ClinicResult, ValidationError, ValidationResult};
use crate::identifiers::{RecordId, ResourceKind};
use crate::medical::role::Role;

/// Registration payload. Holds the plaintext password only until it is hashed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}

/// A stored account. `role` is kept as the raw stored text so that a bad row
/// surfaces as an unknown-role failure when the caller is classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub date_of_birth: Option<NaiveDate>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewAccount {
    /// Registration rules: usernames of 3 to 50 characters, passwords of 8 to
    /// 100 characters.
    pub fn validate(&self) -> ValidationResult<()> {
        let username = self.username.chars().count();
        if !(3..=50).contains(&username) {
            return Err(ValidationError::invalid("username", "must be 3 to 50 characters"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password".to_string()));
        }
        if !(8..=100).contains(&self.password.chars().count()) {
            return Err(ValidationError::invalid("password", "must be 8 to 100 characters"));
        }
        if !self.email.contains('@') {
            return Err(ValidationError::invalid("email", "must contain '@'"));
        }
        Ok(())
    }
}

impl Account {
    /// Hashes a plaintext password.
    pub fn hash_password(password: &str) -> Result<String, BcryptError> {
        hash(password, DEFAULT_COST)
    }

    /// Verifies a plaintext password against a stored hash.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, BcryptError> {
        verify(password, hash)
    }

    /// Builds an unsaved account from a registration payload, hashing the password.
    pub fn from_new_account(new_account: NewAccount) -> ClinicResult<Self> {
        new_account.validate()?;
        let now = Utc::now();
        let password_hash = Self::hash_password(&new_account.password)?;

        Ok(Account {
            id: 0,
            username: new_account.username,
            email: new_account.email,
            password_hash,
            full_name: new_account.full_name,
            role: new_account.role.to_string(),
            date_of_birth: new_account.date_of_birth,
            phone_number: new_account.phone_number,
            address: new_account.address,
            created_at: now,
            updated_at: now,
        })
    }

    /// Classifies the stored role text.
    pub fn role(&self) -> ClinicResult<Role> {
        self.role.parse()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role.as_str()
    }
}

impl Entity for Account {
    const KIND: ResourceKind = ResourceKind::Account;

    entity_timestamps!();

    fn ownership(&self) -> Ownership {
        Ownership::Account(self.id)
    }

    fn validate(&self) -> ValidationResult<()> {
        require_text("username", &self.username)?;
        require_text("email", &self.email)?;
        require_text("full_name", &self.full_name)?;
        if !self.email.contains('@') {
            return Err(ValidationError::invalid("email", "must contain '@'"));
        }
        Ok(())
    }

    fn protected_fields() -> &'static [&'static str] {
        &["id", "role", "password_hash", "created_at", "updated_at"]
    }

    /// Emails compare case-insensitively.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![
            ("email", self.email.trim().to_lowercase()),
            ("username", self.username.clone()),
        ]
    }
}
