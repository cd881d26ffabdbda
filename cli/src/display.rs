use console::style;
use ferry_core::agent::{MessageSink, render_tool_calls};
use ferry_core::traits::Message;

/// Prints each message to stderr: role in blue, content dimmed.
pub struct ConsoleSink;

impl MessageSink for ConsoleSink {
    fn on_message(&self, message: &Message) {
        let tool_calls = render_tool_calls(message)
            .map(|calls| format!(" Tool calls: {}", calls))
            .unwrap_or_default();

        eprintln!(
            "{}: {}{}",
            style(message.role).blue(),
            style(&message.content).dim(),
            tool_calls
        );
    }
}

pub fn print_steps(steps: &[Message]) {
    eprintln!("{}", style(format!("── {} steps ──", steps.len())).dim());
    for (i, step) in steps.iter().enumerate() {
        let label = match &step.name {
            Some(name) => format!("{} ({})", step.role, name),
            None => step.role.to_string(),
        };
        eprintln!("{:>3}. {}", i + 1, style(label).yellow());
    }
}
