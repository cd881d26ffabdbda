pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod tools;
pub mod traits;

pub use agent::{AskResponse, Assistant, AssistantOptions, Context, MessageSink, ToolRegistry};
pub use config::Config;
pub use error::{AssistantError, AssistantResult};
pub use providers::*;
pub use tools::*;
pub use traits::*;
