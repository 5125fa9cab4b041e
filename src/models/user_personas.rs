use serde::{Deserialize, Serialize};

/// The user-side persona active for the chat being scanned.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Persona {
    pub name: String,
    pub description: Option<String>,
}
