pub mod characters;
pub mod chats;
pub mod lorebooks;
pub mod settings;
pub mod user_personas;

pub use characters::CharacterMetadata;
pub use chats::{ChatMessage, MessageRole};
pub use lorebooks::{EntryPosition, Lorebook, LorebookEntry, SelectiveLogic};
pub use settings::LoreSettings;
pub use user_personas::Persona;
