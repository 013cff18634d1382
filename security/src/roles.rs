// security/src/roles.rs
use models::{ClinicResult, RecordId, Role};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The authenticated party behind a request, as resolved from its account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: RecordId,
    pub role: String, // stored role text, classified on every decision
    #[serde(default)]
    pub lab_ids: Vec<RecordId>, // labs the caller works at, technicians only
}

impl Caller {
    pub fn new(id: RecordId, role: &str) -> Self {
        Caller {
            id,
            role: role.to_string(),
            lab_ids: Vec::new(),
        }
    }

    pub fn with_role(id: RecordId, role: Role) -> Self {
        Caller::new(id, role.as_str())
    }

    pub fn attached_to(mut self, lab_id: RecordId) -> Self {
        if !self.lab_ids.contains(&lab_id) {
            self.lab_ids.push(lab_id);
        }
        self
    }

    pub fn works_at(&self, lab_id: RecordId) -> bool {
        self.lab_ids.contains(&lab_id)
    }
}

/// Maps a caller onto the fixed role set. A stored role outside the set means
/// the account table is corrupt, so the caller gets no permission class.
pub fn classify(caller: &Caller) -> ClinicResult<Role> {
    Role::from_str(&caller.role).inspect_err(|_| {
        log::error!("Account {} carries unknown role {:?}", caller.id, caller.role);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::ErrorKind;

    #[test]
    fn classifies_each_stored_role() {
        for role in Role::ALL {
            assert_eq!(classify(&Caller::with_role(1, role)).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_reported() {
        let err = classify(&Caller::new(3, "janitor")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownRole);
        assert!(err.to_string().contains("janitor"));
    }

    #[test]
    fn lab_attachment_is_deduplicated() {
        let caller = Caller::with_role(4, Role::LabTechnician).attached_to(2).attached_to(2);
        assert_eq!(caller.lab_ids, vec![2]);
        assert!(caller.works_at(2));
        assert!(!caller.works_at(3));
    }
}
