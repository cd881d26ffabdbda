use crate::tools::extract_string_arg;
use crate::traits::{Tool, ToolOutput};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tokio::process::Command;

pub struct ShellTool {
    workspace: std::path::PathBuf,
}

impl ShellTool {
    pub fn new(workspace: impl AsRef<std::path::Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command in the workspace directory"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    // A non-zero exit is a result for the model to read, not a failure.
    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolOutput> {
        let command = extract_string_arg(&args, "command")?;

        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(&self.workspace)
            .output()
            .await
            .with_context(|| format!("Failed to execute command: {}", command))?;

        Ok(ToolOutput::from(json!({
            "status": output.status.code(),
            "stdout": String::from_utf8_lossy(&output.stdout),
            "stderr": String::from_utf8_lossy(&output.stderr),
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn captures_stdout_and_status() {
        let tmp = TempDir::new().unwrap();
        let tool = ShellTool::new(tmp.path());

        let ToolOutput::Structured(value) =
            tool.execute(json!({"command": "echo hi"})).await.unwrap()
        else {
            panic!("expected structured output");
        };
        assert_eq!(value["status"], 0);
        assert_eq!(value["stdout"], "hi\n");
    }

    #[tokio::test]
    async fn runs_in_workspace() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("marker.txt"), "").unwrap();
        let tool = ShellTool::new(tmp.path());

        let ToolOutput::Structured(value) = tool.execute(json!({"command": "ls"})).await.unwrap()
        else {
            panic!("expected structured output");
        };
        assert!(value["stdout"].as_str().unwrap().contains("marker.txt"));
    }

    #[tokio::test]
    async fn failing_command_reports_status() {
        let tmp = TempDir::new().unwrap();
        let tool = ShellTool::new(tmp.path());

        let ToolOutput::Structured(value) =
            tool.execute(json!({"command": "exit 3"})).await.unwrap()
        else {
            panic!("expected structured output");
        };
        assert_eq!(value["status"], 3);
    }
}
