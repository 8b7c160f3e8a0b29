pub mod prompt;

pub use prompt::{NumericPrompt, PromptOutcome};
