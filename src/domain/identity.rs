use serde::{Deserialize, Serialize};

/// Caller role as asserted by the identity provider.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Operator,
}

/// An already-verified identity, passed explicitly to every engine
/// operation. The core trusts these fields verbatim; token verification
/// happens upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub role: Role,
    pub email: String,
    pub full_name: String,
}

impl Identity {
    pub fn customer(id: impl Into<String>, email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Customer,
            email: email.into(),
            full_name: name.into(),
        }
    }

    pub fn operator(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Operator,
            email: String::new(),
            full_name: String::new(),
        }
    }
}
