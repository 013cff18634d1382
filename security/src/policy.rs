// security/src/policy.rs
use anyhow::{bail, Context, Result};
use models::{ClinicError, ClinicResult, ResourceKind, Role, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Read,
    List,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Create,
        Operation::Read,
        Operation::List,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::List => "list",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ValidationError;

    /// Accepts `get` for a read by id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "get" => Ok(Operation::Read),
            normalized => Operation::ALL
                .iter()
                .copied()
                .find(|op| op.as_str() == normalized)
                .ok_or_else(|| ValidationError::invalid("operation", format!("unknown operation '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Turns a denial into an `Authorization` error.
    pub fn into_result(self) -> ClinicResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(ClinicError::Authorization(reason)),
        }
    }
}

/// Predicate over `(role, is_owner)` for one table entry. Admins never reach
/// a rule; they are allowed before the table is consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Any classified caller.
    Authenticated,
    Owner,
    Roles(Vec<Role>),
    OwnerOrRoles(Vec<Role>),
}

impl Rule {
    pub fn permits(&self, role: Role, is_owner: bool) -> bool {
        match self {
            Rule::Authenticated => true,
            Rule::Owner => is_owner,
            Rule::Roles(roles) => roles.contains(&role),
            Rule::OwnerOrRoles(roles) => is_owner || roles.contains(&role),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |roles: &[Role]| roles.iter().map(Role::as_str).collect::<Vec<_>>().join("|");
        match self {
            Rule::Authenticated => write!(f, "authenticated"),
            Rule::Owner => write!(f, "owner"),
            Rule::Roles(roles) => write!(f, "roles({})", names(roles)),
            Rule::OwnerOrRoles(roles) => write!(f, "owner or roles({})", names(roles)),
        }
    }
}

/// How an override entry in a policy file spells a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Authenticated,
    Owner,
    Roles,
    OwnerOrRoles,
    /// Removes the entry; only admins keep access.
    Nobody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyEntry {
    pub kind: ResourceKind,
    pub operation: Operation,
    pub allow: Access,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl PolicyEntry {
    fn into_rule(self) -> Result<Option<Rule>> {
        let needs_roles = matches!(self.allow, Access::Roles | Access::OwnerOrRoles);
        if needs_roles && self.roles.is_empty() {
            bail!("policy entry for {} {} lists no roles", self.operation, self.kind);
        }
        Ok(match self.allow {
            Access::Authenticated => Some(Rule::Authenticated),
            Access::Owner => Some(Rule::Owner),
            Access::Roles => Some(Rule::Roles(self.roles)),
            Access::OwnerOrRoles => Some(Rule::OwnerOrRoles(self.roles)),
            Access::Nobody => None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyFile {
    #[serde(default)]
    pub rules: Vec<PolicyEntry>,
}

/// Declarative table keyed by `(resource kind, operation)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    rules: BTreeMap<(ResourceKind, Operation), Rule>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        use Operation::*;
        use ResourceKind::*;
        use Role::{Doctor, LabTechnician};

        let mut table = PolicyTable::empty();
        // Profiles: self-service reads and edits, accounts are created by registration.
        table.set(Account, Read, Rule::Owner);
        table.set(Account, Update, Rule::Owner);
        table.set(DoctorProfile, Read, Rule::Authenticated);
        table.set(DoctorProfile, List, Rule::Authenticated);
        table.set(DoctorProfile, Update, Rule::Owner);
        table.set(LabTechnicianProfile, Read, Rule::Owner);
        table.set(LabTechnicianProfile, Update, Rule::Owner);
        table.set(Lab, Read, Rule::Authenticated);
        table.set(Lab, List, Rule::Authenticated);
        table.set(Lab, Update, Rule::Owner);

        table.set(Patient, Create, Rule::Roles(vec![Doctor]));
        table.set(Patient, Read, Rule::OwnerOrRoles(vec![Doctor]));
        table.set(Patient, List, Rule::Roles(vec![Doctor]));
        table.set(Patient, Update, Rule::Roles(vec![Doctor]));
        table.set(Patient, Delete, Rule::Roles(vec![Doctor]));

        // Appointments are cancelled rather than deleted by their owners.
        table.set(Appointment, Create, Rule::Owner);
        table.set(Appointment, Read, Rule::Owner);
        table.set(Appointment, List, Rule::Owner);
        table.set(Appointment, Update, Rule::Owner);

        for kind in [Diagnosis, Prescription] {
            table.set(kind, Create, Rule::Roles(vec![Doctor]));
            table.set(kind, Read, Rule::OwnerOrRoles(vec![Doctor]));
            table.set(kind, List, Rule::OwnerOrRoles(vec![Doctor]));
            table.set(kind, Update, Rule::Owner);
            table.set(kind, Delete, Rule::Owner);
        }

        table.set(LabTest, Create, Rule::Roles(vec![Doctor]));
        table.set(LabTest, Read, Rule::OwnerOrRoles(vec![Doctor, LabTechnician]));
        // Open to any caller, unlike the patient list.
        table.set(LabTest, List, Rule::Authenticated);
        table.set(LabTest, Update, Rule::Roles(vec![Doctor]));
        table.set(LabTest, Delete, Rule::Roles(vec![Doctor]));

        for kind in [LabReport, LabEquipment] {
            table.set(kind, Create, Rule::Roles(vec![Doctor, LabTechnician]));
            table.set(kind, Read, Rule::OwnerOrRoles(vec![Doctor]));
            table.set(kind, List, Rule::OwnerOrRoles(vec![Doctor]));
            table.set(kind, Update, Rule::Owner);
            table.set(kind, Delete, Rule::Owner);
        }

        table.set(NutritionalPlan, Create, Rule::OwnerOrRoles(vec![Doctor]));
        table.set(NutritionalPlan, Read, Rule::OwnerOrRoles(vec![Doctor]));
        table.set(NutritionalPlan, List, Rule::OwnerOrRoles(vec![Doctor]));
        table.set(NutritionalPlan, Update, Rule::Roles(vec![Doctor]));
        table.set(NutritionalPlan, Delete, Rule::Roles(vec![Doctor]));

        for op in Operation::ALL {
            table.set(Document, op, Rule::Owner);
        }

        table.set(ChatMessage, Create, Rule::Owner);
        table.set(ChatMessage, Read, Rule::Owner);
        table.set(ChatMessage, List, Rule::Owner);
        table
    }
}

impl PolicyTable {
    /// A table where only admins are allowed anything.
    pub fn empty() -> Self {
        PolicyTable { rules: BTreeMap::new() }
    }

    pub fn set(&mut self, kind: ResourceKind, operation: Operation, rule: Rule) {
        self.rules.insert((kind, operation), rule);
    }

    pub fn clear(&mut self, kind: ResourceKind, operation: Operation) {
        self.rules.remove(&(kind, operation));
    }

    pub fn rule(&self, kind: ResourceKind, operation: Operation) -> Option<&Rule> {
        self.rules.get(&(kind, operation))
    }

    pub fn entries(&self) -> impl Iterator<Item = (ResourceKind, Operation, &Rule)> {
        self.rules.iter().map(|((kind, op), rule)| (*kind, *op, rule))
    }

    pub fn authorize(&self, role: Role, operation: Operation, kind: ResourceKind, is_owner: bool) -> Decision {
        if role == Role::Admin {
            return Decision::Allow;
        }
        match self.rule(kind, operation) {
            Some(rule) if rule.permits(role, is_owner) => Decision::Allow,
            _ => Decision::Deny(format!("not authorized to {} {}", operation, kind)),
        }
    }

    /// Applies override entries on top of this table.
    pub fn merge(&mut self, file: PolicyFile) -> Result<()> {
        for entry in file.rules {
            let (kind, operation) = (entry.kind, entry.operation);
            match entry.into_rule()? {
                Some(rule) => self.set(kind, operation, rule),
                None => self.clear(kind, operation),
            }
        }
        Ok(())
    }

    /// The default table with the overrides of a YAML document applied.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: PolicyFile = serde_yaml::from_str(content).context("Failed to parse policy YAML")?;
        let mut table = PolicyTable::default();
        table.merge(file)?;
        Ok(table)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file {}", path.display()))?;
        let table = PolicyTable::from_yaml_str(&content)?;
        log::info!("Loaded permission overrides from {}", path.display());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const NON_ADMIN: [Role; 3] = [Role::Doctor, Role::Patient, Role::LabTechnician];

    #[test]
    fn admin_is_allowed_everything() {
        let table = PolicyTable::default();
        for kind in ResourceKind::ALL {
            for op in Operation::ALL {
                for owner in [true, false] {
                    assert_eq!(table.authorize(Role::Admin, op, kind, owner), Decision::Allow);
                }
            }
        }
        assert!(PolicyTable::empty().authorize(Role::Admin, Operation::Delete, ResourceKind::Account, false).is_allowed());
    }

    #[test]
    fn non_owners_cannot_change_owner_restricted_records() {
        let table = PolicyTable::default();
        let owner_restricted = table
            .entries()
            .filter(|(_, op, rule)| matches!(op, Operation::Update | Operation::Delete) && **rule == Rule::Owner)
            .map(|(kind, op, _)| (kind, op))
            .collect::<Vec<_>>();
        assert!(!owner_restricted.is_empty());
        for (kind, op) in owner_restricted {
            for role in NON_ADMIN {
                assert!(!table.authorize(role, op, kind, false).is_allowed(), "{role} {op} {kind}");
                assert!(table.authorize(role, op, kind, true).is_allowed(), "{role} {op} {kind}");
            }
        }
    }

    #[test]
    fn missing_rule_denies_with_reason() {
        let table = PolicyTable::default();
        assert_eq!(
            table.authorize(Role::Patient, Operation::Delete, ResourceKind::Appointment, true),
            Decision::Deny("not authorized to delete appointment".to_string())
        );
    }

    #[test]
    fn patient_list_requires_doctor_but_lab_test_list_is_open() {
        let table = PolicyTable::default();
        assert!(!table.authorize(Role::Patient, Operation::List, ResourceKind::Patient, false).is_allowed());
        assert!(!table.authorize(Role::LabTechnician, Operation::List, ResourceKind::Patient, false).is_allowed());
        assert!(table.authorize(Role::Doctor, Operation::List, ResourceKind::Patient, false).is_allowed());
        // Known gap: every role can list every lab test.
        for role in NON_ADMIN {
            assert!(table.authorize(role, Operation::List, ResourceKind::LabTest, false).is_allowed());
        }
    }

    #[test]
    fn authoring_roles_create_clinical_records() {
        let table = PolicyTable::default();
        for kind in [ResourceKind::Patient, ResourceKind::Diagnosis, ResourceKind::Prescription] {
            assert!(table.authorize(Role::Doctor, Operation::Create, kind, false).is_allowed());
            assert!(!table.authorize(Role::Patient, Operation::Create, kind, true).is_allowed());
            assert!(!table.authorize(Role::LabTechnician, Operation::Create, kind, false).is_allowed());
        }
        for kind in [ResourceKind::LabReport, ResourceKind::LabEquipment] {
            assert!(table.authorize(Role::LabTechnician, Operation::Create, kind, false).is_allowed());
            assert!(table.authorize(Role::Doctor, Operation::Create, kind, false).is_allowed());
            assert!(!table.authorize(Role::Patient, Operation::Create, kind, false).is_allowed());
        }
    }

    #[test]
    fn owners_read_their_own_records_whatever_the_role() {
        let table = PolicyTable::default();
        for kind in [ResourceKind::Account, ResourceKind::Appointment, ResourceKind::Document, ResourceKind::NutritionalPlan] {
            for role in NON_ADMIN {
                assert!(table.authorize(role, Operation::Read, kind, true).is_allowed());
            }
            assert!(!table.authorize(Role::Patient, Operation::Read, kind, false).is_allowed());
        }
    }

    #[test]
    fn reads_by_id_follow_the_list_rule() {
        let table = PolicyTable::default();
        for kind in [ResourceKind::Diagnosis, ResourceKind::Prescription, ResourceKind::LabReport, ResourceKind::LabEquipment] {
            assert_eq!(table.rule(kind, Operation::Read), table.rule(kind, Operation::List), "{kind}");
        }
    }

    #[test]
    fn operations_parse_by_name() {
        assert_eq!("list".parse::<Operation>().unwrap(), Operation::List);
        assert_eq!("GET".parse::<Operation>().unwrap(), Operation::Read);
        assert!("approve".parse::<Operation>().is_err());
    }

    #[test]
    fn deny_converts_to_authorization_error() {
        let err = Decision::Deny("not authorized to read lab".to_string()).into_result().unwrap_err();
        assert_eq!(err.to_string(), "Permission denied: not authorized to read lab");
        assert!(Decision::Allow.into_result().is_ok());
    }

    #[test]
    fn yaml_overrides_replace_and_remove_entries() {
        let yaml = r#"
rules:
  - kind: lab_test
    operation: list
    allow: roles
    roles: [doctor, lab_technician]
  - kind: doctor_profile
    operation: list
    allow: nobody
"#;
        let table = PolicyTable::from_yaml_str(yaml).unwrap();
        assert!(!table.authorize(Role::Patient, Operation::List, ResourceKind::LabTest, false).is_allowed());
        assert!(table.authorize(Role::LabTechnician, Operation::List, ResourceKind::LabTest, false).is_allowed());
        assert_eq!(table.rule(ResourceKind::DoctorProfile, Operation::List), None);
        // Untouched entries keep their defaults.
        assert_eq!(table.rule(ResourceKind::Document, Operation::Delete), Some(&Rule::Owner));
    }

    #[test]
    fn role_rules_without_roles_are_rejected() {
        let yaml = "rules:\n  - kind: lab\n    operation: create\n    allow: roles\n";
        let err = PolicyTable::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("lists no roles"));
    }

    #[test]
    fn loads_overrides_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "rules:\n  - kind: lab\n    operation: create\n    allow: roles\n    roles: [lab_technician]").unwrap();
        let table = PolicyTable::from_yaml_file(file.path()).unwrap();
        assert!(table.authorize(Role::LabTechnician, Operation::Create, ResourceKind::Lab, false).is_allowed());
    }
}
