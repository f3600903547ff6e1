//! Text generation providers.

mod gemini;

pub use gemini::{GeminiModel, GeminiTextProvider, GeminiTextProviderBuilder};
