//! File read/write/delete tools.

use async_trait::async_trait;

use super::{ParamKind, ParamSpec, Tool, ToolArgs, ToolContext, ToolError};

/// Read a file's full content.
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read and return the full content of a specified file."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "path",
            ParamKind::String,
            "Path to the file whose contents will be read (e.g., './README.md').",
        )]
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let path = args.require_str("path")?;
        let full = ctx.resolve(path);

        match tokio::fs::metadata(&full).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::NotFound(path.to_string()));
            }
            Err(e) => {
                return Err(ToolError::Execution(format!("Cannot inspect {}: {}", path, e)));
            }
        }

        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| ToolError::Execution(format!("Error reading file {}: {}", path, e)))
    }
}

/// Create or overwrite a file.
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite a file with the given content at the specified path."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required(
                "path",
                ParamKind::String,
                "The file path where the content will be written (e.g., './output.txt').",
            ),
            ParamSpec::required(
                "content",
                ParamKind::String,
                "The full string content to write into the file.",
            ),
        ]
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let path = args.require_str("path")?;
        let content = args.require_str("content")?;

        tokio::fs::write(ctx.resolve(path), content)
            .await
            .map_err(|e| ToolError::Execution(format!("Error writing file {}: {}", path, e)))?;

        tracing::debug!(target: "tool", path, bytes = content.len(), "File written");
        Ok(format!("File at the path {} was successfully written", path))
    }
}

/// Delete a single file.
pub struct DeleteFile;

#[async_trait]
impl Tool for DeleteFile {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn description(&self) -> &str {
        "Delete a specific file from the file system."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "path",
            ParamKind::String,
            "Path to the file that should be deleted (e.g., './temp.log'). Make sure the file is not needed anymore.",
        )]
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let path = args.require_str("path")?;
        let full = ctx.resolve(path);

        // Existence is checked up front so a missing target is always NotFound.
        let metadata = match tokio::fs::symlink_metadata(&full).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::NotFound(path.to_string()));
            }
            Err(e) => {
                return Err(ToolError::Execution(format!("Cannot inspect {}: {}", path, e)));
            }
        };

        if metadata.is_dir() {
            return Err(ToolError::Execution(format!(
                "{} is a directory, not a file",
                path
            )));
        }

        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| ToolError::Execution(format!("File at the path {} can't be deleted: {}", path, e)))?;

        Ok(format!("File at the path {} was successfully deleted", path))
    }
}

/// Create a directory and any missing parents.
pub struct MakeDirectory;

#[async_trait]
impl Tool for MakeDirectory {
    fn name(&self) -> &str {
        "mkdir"
    }

    fn description(&self) -> &str {
        "Create a directory, including any missing parent directories."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "path",
            ParamKind::String,
            "Directory path to create (e.g., './src/utils').",
        )]
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let path = args.require_str("path")?;

        tokio::fs::create_dir_all(ctx.resolve(path))
            .await
            .map_err(|e| ToolError::Execution(format!("Error creating directory {}: {}", path, e)))?;

        Ok(format!("Directory {} was successfully created", path))
    }
}
