pub mod generation;
pub mod models;
pub mod prompts;
pub mod utils;

// Re-export config from crate root
pub use crate::config;
