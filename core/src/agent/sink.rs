use crate::traits::Message;
use tracing::debug;

/// Receives every message an assistant appends while in debug mode.
/// Must not influence the conversation.
pub trait MessageSink: Send + Sync {
    fn on_message(&self, message: &Message);
}

/// Emits each message as a `tracing` debug event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn on_message(&self, message: &Message) {
        let tool_calls = render_tool_calls(message).unwrap_or_default();
        debug!(
            role = %message.role,
            content = %message.content,
            tool_calls = %tool_calls,
            "message"
        );
    }
}

pub fn render_tool_calls(message: &Message) -> Option<String> {
    let calls = message.tool_calls.as_ref()?;
    Some(serde_json::to_string(calls).unwrap_or_else(|_| format!("{calls:?}")))
}

/// `"<role>: <content>"`, plus the tool calls when present.
pub fn format_message(message: &Message) -> String {
    match render_tool_calls(message) {
        Some(calls) => format!("{}: {} Tool calls: {}", message.role, message.content, calls),
        None => format!("{}: {}", message.role, message.content),
    }
}
