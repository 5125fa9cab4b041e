use serde::{Deserialize, Serialize};

/// Decrypted character fields the engine may pull into an entry's scan
/// window. Callers hand these in already resolved; the engine never loads
/// or decrypts character records itself.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CharacterMetadata {
    pub name: String,
    pub description: Option<String>,
    pub personality: Option<String>,
    pub scenario: Option<String>,
    pub creator_notes: Option<String>,
    /// Text the character injects at a fixed chat depth ("character note").
    pub depth_prompt: Option<String>,
}
