use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A company employee permitted to resolve service-change requests,
/// flattened from the `users` + `operators` join.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Operator {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub universal_id: String,
    pub department: String,
}

impl Operator {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
