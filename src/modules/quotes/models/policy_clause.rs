use serde::{Deserialize, Serialize};

/// Terms-and-conditions entry travelling with a quote. Not priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyClause {
    pub id: String,
    /// Free-form grouping such as "payment" or "warranty"
    pub clause_type: String,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub order: i32,
}
