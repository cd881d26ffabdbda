pub mod context;
pub mod loop_;
pub mod registry;
pub mod sink;

pub use context::Context;
pub use loop_::{AskResponse, Assistant, AssistantOptions};
pub use registry::ToolRegistry;
pub use sink::{MessageSink, TracingSink, format_message, render_tool_calls};
