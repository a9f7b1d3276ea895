use serde::{Deserialize, Serialize};

/// A single directory record. Identity is `id`; every other field is mutable
/// in place once stored.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub salary: f64,
}

impl Employee {
    pub fn new(id: i64, name: impl Into<String>, position: impl Into<String>, salary: f64) -> Self {
        Self {
            id,
            name: name.into(),
            position: position.into(),
            salary,
        }
    }

    /// Ids must be strictly positive; zero and negatives are rejected at the
    /// API boundary.
    pub fn has_valid_id(&self) -> bool {
        self.id > 0
    }
}
