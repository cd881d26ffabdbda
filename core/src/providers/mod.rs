pub mod factory;
pub mod ollama;
pub mod scripted;

pub use factory::create_provider;
pub use ollama::OllamaProvider;
pub use scripted::{RecordedRequest, ScriptedProvider};
