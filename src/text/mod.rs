//! Text generation module.

mod provider;
pub mod providers;
mod types;

pub use provider::TextProvider;
pub use types::{GeneratedText, TextRequest};
