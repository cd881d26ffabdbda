use crate::tools::extract_string_arg_opt;
use crate::traits::{Tool, ToolOutput};
use async_trait::async_trait;
use serde_json::json;

const DEFAULT_FORMAT: &str = "%Y-%m-%d %H:%M:%S (%A)";

#[derive(Debug, Default)]
pub struct CurrentTimeTool;

impl CurrentTimeTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current local date and time"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "format": {
                    "type": "string",
                    "description": "strftime-style format, defaults to date, time and weekday"
                }
            }
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolOutput> {
        let format = extract_string_arg_opt(&args, "format", DEFAULT_FORMAT);
        let mut rendered = String::new();
        std::fmt::write(
            &mut rendered,
            format_args!("{}", chrono::Local::now().format(&format)),
        )
        .map_err(|_| anyhow::anyhow!("Invalid time format '{}'", format))?;
        Ok(ToolOutput::Text(rendered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn custom_format() {
        let output = CurrentTimeTool::new()
            .execute(json!({"format": "%Y"}))
            .await
            .unwrap();
        let ToolOutput::Text(year) = output else {
            panic!("expected text output");
        };
        assert_eq!(year.len(), 4);
        assert!(year.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn invalid_format_is_an_error() {
        let result = CurrentTimeTool::new().execute(json!({"format": "%Q"})).await;
        assert!(result.is_err());
    }
}
