use crate::tools::extract_string_arg;
use crate::traits::{Tool, ToolOutput};
use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use std::path::{Component, Path, PathBuf};

pub struct FileReadTool {
    workspace: PathBuf,
}

impl FileReadTool {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }
}

fn escapes_workspace(path: &Path) -> bool {
    path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir))
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read the contents of a file from the workspace"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file to read, relative to the workspace"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolOutput> {
        let path = extract_string_arg(&args, "path")?;
        if escapes_workspace(Path::new(&path)) {
            anyhow::bail!("Path '{}' is outside the workspace", path);
        }

        let content = tokio::fs::read_to_string(self.workspace.join(&path))
            .await
            .with_context(|| format!("Failed to read file {}", path))?;

        Ok(ToolOutput::from(json!({ "path": path, "content": content })))
    }
}
