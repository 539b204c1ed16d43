//! Code search tools: grep/regex search.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::RegexBuilder;
use walkdir::WalkDir;

use super::{ParamKind, ParamSpec, Tool, ToolArgs, ToolContext, ToolError};

/// Stop collecting after this many matching lines.
const MAX_MATCHES: usize = 200;

/// Search file contents with a regular expression.
pub struct GrepSearch;

#[async_trait]
impl Tool for GrepSearch {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search for a specific text pattern inside a file (or recursively inside a directory) using regular expressions. Returns matching lines as path:line:text."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required(
                "pattern",
                ParamKind::String,
                "The regular expression pattern to search for (e.g., 'func', '^import').",
            ),
            ParamSpec::required(
                "path",
                ParamKind::String,
                "Path to the file or directory where the pattern should be searched.",
            ),
            ParamSpec::optional(
                "case_sensitive",
                ParamKind::Boolean,
                "Whether search is case-sensitive (default: true)",
            ),
        ]
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let pattern = args.require_str("pattern")?;
        let path = args.require_str("path")?;
        let case_sensitive = args.get_bool("case_sensitive").unwrap_or(true);

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| ToolError::Argument(format!("invalid pattern `{}`: {}", pattern, e)))?;

        let root = ctx.resolve(path);
        if !root.exists() {
            return Err(ToolError::NotFound(path.to_string()));
        }

        let display_base = ctx.working_dir.clone();
        let matches = tokio::task::spawn_blocking(move || search(&regex, &root, &display_base))
            .await
            .map_err(|e| ToolError::Execution(format!("search task failed: {}", e)))??;

        if matches.is_empty() {
            return Ok(format!("No matches found for pattern: {}", pattern));
        }

        let mut result = matches.join("\n");
        if matches.len() >= MAX_MATCHES {
            result.push_str(&format!("\n\n... (showing first {} matches)", MAX_MATCHES));
        }
        Ok(result)
    }
}

fn search(regex: &regex::Regex, root: &Path, display_base: &Path) -> Result<Vec<String>, ToolError> {
    let files: Vec<PathBuf> = if root.is_file() {
        vec![root.to_path_buf()]
    } else {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect()
    };

    let mut matches = Vec::new();
    for file in files {
        // Binary or unreadable files are skipped rather than failing the search.
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        let shown = file.strip_prefix(display_base).unwrap_or(&file);
        for (number, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                matches.push(format!("{}:{}:{}", shown.display(), number + 1, line));
                if matches.len() >= MAX_MATCHES {
                    return Ok(matches);
                }
            }
        }
    }
    Ok(matches)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().map(|s| s.starts_with('.')).unwrap_or(false)
}
