pub mod errors;
pub mod logging;
pub mod models;
pub mod services;
pub mod text_processing;

// Re-export the engine surface for convenience
pub use errors::{AppError, Result};
pub use services::lore_engine::{LoreEngine, LoreScanParams, ProcessedLore};
pub use services::token_counter::TokenCounter;
