pub mod lore_engine;
pub mod token_counter;

pub use lore_engine::{LoreEngine, LoreScanParams, ProcessedLore};
pub use token_counter::{EstimatingTokenCounter, TokenCounter};
