// models/src/patch.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::Entity;
use crate::errors::{ValidationError, ValidationResult};

/// A partial update: only the keys present are written, everything else on
/// the stored record is left as it was.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPatch(Map<String, Value>);

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter, mostly for callers assembling patches in code.
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// Accepts any JSON value; only objects are valid patches.
    pub fn from_value(value: Value) -> ValidationResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ValidationError::invalid(
                "patch",
                format!("expected a JSON object, got {}", other),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Merges the patch over `current` and returns the resulting record.
    ///
    /// Fails on fields the record does not have, on protected fields, and on
    /// values that do not deserialize into the field's type.
    pub fn apply<E: Entity>(&self, current: &E) -> ValidationResult<E> {
        if self.is_empty() {
            return Ok(current.clone());
        }

        let mut document = match serde_json::to_value(current) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                return Err(ValidationError::invalid(
                    E::KIND.as_str(),
                    "record does not serialize to an object",
                ));
            }
        };

        let protected = E::protected_fields();
        for (field, value) in &self.0 {
            if protected.contains(&field.as_str()) {
                return Err(ValidationError::ReadOnlyField(field.clone()));
            }
            match document.get_mut(field) {
                Some(slot) => *slot = value.clone(),
                None => return Err(ValidationError::UnknownField(field.clone())),
            }
        }

        serde_json::from_value(Value::Object(document))
            .map_err(|e| ValidationError::invalid(E::KIND.as_str(), e.to_string()))
    }
}

impl From<Map<String, Value>> for RecordPatch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
