//! Concrete embedding providers.

pub mod disabled;
pub mod ollama;
pub mod trigram;

pub use disabled::DisabledProvider;
pub use ollama::OllamaProvider;
pub use trigram::TrigramProvider;
