// UMSS Assistant Core
// Intent resolution and conflict-checked class scheduling for the campus assistant

pub mod assistant;
pub mod brain;
pub mod config;
pub mod dialogue;
pub mod error;
pub mod knowledge;
pub mod models;
pub mod schedule;

pub use assistant::{Assistant, Reply};
pub use config::AssistantConfig;
pub use error::{AppError, Result};

#[cfg(test)]
mod tests;
