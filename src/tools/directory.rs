//! Directory inspection tools: list, tree, pwd.

use std::path::Path;

use async_trait::async_trait;
use walkdir::{DirEntry, WalkDir};

use super::{truncate_output, ParamKind, ParamSpec, Tool, ToolArgs, ToolContext, ToolError};

/// Tree output stops descending past this depth.
const MAX_TREE_DEPTH: usize = 6;

/// Entries rendered before the tree is cut short. All entries are still counted.
const MAX_TREE_ENTRIES: usize = 500;

/// List the entries of a directory.
pub struct ListDirectory;

#[async_trait]
impl Tool for ListDirectory {
    fn name(&self) -> &str {
        "list"
    }

    fn description(&self) -> &str {
        "List all files and directories in the current working directory, or in the given path."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::optional(
            "path",
            ParamKind::String,
            "Directory to list (defaults to the current working directory).",
        )]
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let path = args.get_str("path").unwrap_or(".");
        let dir = ctx.resolve(path);

        if !dir.exists() {
            return Err(ToolError::NotFound(path.to_string()));
        }

        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| ToolError::Execution(format!("Cannot list {}: {}", path, e)))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ToolError::Execution(format!("Cannot list {}: {}", path, e)))?
        {
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();

        Ok(truncate_output(names.join("\n")))
    }
}

/// Render a directory hierarchy.
pub struct Tree;

#[async_trait]
impl Tool for Tree {
    fn name(&self) -> &str {
        "tree"
    }

    fn description(&self) -> &str {
        "Generate a visual tree-like structure of directories and files from a given path."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required(
            "path",
            ParamKind::String,
            "Directory path to start building the tree structure (e.g., '.', './src').",
        )]
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let path = args.require_str("path")?.to_string();
        let root = ctx.resolve(&path);

        if !root.is_dir() {
            return if root.exists() {
                Err(ToolError::Argument(format!("{} is not a directory", path)))
            } else {
                Err(ToolError::NotFound(path))
            };
        }

        tokio::task::spawn_blocking(move || render_tree(&path, &root))
            .await
            .map_err(|e| ToolError::Execution(format!("tree task failed: {}", e)))
    }
}

struct TreeNode {
    depth: usize,
    name: String,
    is_dir: bool,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn render_tree(label: &str, root: &Path) -> String {
    let mut nodes = Vec::new();
    let mut unreadable = Vec::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_TREE_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        match entry {
            Ok(entry) => nodes.push(TreeNode {
                depth: entry.depth(),
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: entry.file_type().is_dir(),
            }),
            Err(e) => {
                tracing::debug!(target: "tool", error = %e, "Skipping unreadable tree entry");
                unreadable.push(describe_walk_error(root, &e));
            }
        }
    }

    let dirs = nodes.iter().filter(|n| n.is_dir).count();
    let files = nodes.len() - dirs;
    let last = last_sibling_flags(&nodes);

    let mut out = String::from(label);
    // for each ancestor level: whether that ancestor was the last of its siblings
    let mut ancestors_last: Vec<bool> = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        if i == MAX_TREE_ENTRIES {
            out.push_str(&format!("\n... [{} more entries not shown]", nodes.len() - i));
            break;
        }
        ancestors_last.truncate(node.depth - 1);

        out.push('\n');
        for &ancestor_last in &ancestors_last {
            out.push_str(if ancestor_last { "    " } else { "│   " });
        }
        out.push_str(if last[i] { "└── " } else { "├── " });
        out.push_str(&node.name);

        ancestors_last.push(last[i]);
    }

    out.push_str(&format!("\n\n{} directories, {} files", dirs, files));

    if !unreadable.is_empty() {
        out.push_str("\n\nUnreadable entries:");
        for line in &unreadable {
            out.push_str("\n  ");
            out.push_str(line);
        }
    }

    truncate_output(out)
}

/// For pre-order `nodes`, whether each node is the last child of its parent.
fn last_sibling_flags(nodes: &[TreeNode]) -> Vec<bool> {
    let mut flags = vec![false; nodes.len()];
    // later_sibling[d]: a node at depth d follows under the same parent
    let mut later_sibling = vec![false; MAX_TREE_DEPTH + 2];

    for (i, node) in nodes.iter().enumerate().rev() {
        let depth = node.depth;
        flags[i] = !later_sibling[depth];
        later_sibling[depth] = true;
        for deeper in later_sibling.iter_mut().skip(depth + 1) {
            *deeper = false;
        }
    }
    flags
}

fn describe_walk_error(root: &Path, err: &walkdir::Error) -> String {
    let path = err
        .path()
        .map(|p| p.strip_prefix(root).unwrap_or(p).display().to_string())
        .unwrap_or_else(|| "?".to_string());
    match err.io_error() {
        Some(io) => format!("{}: {}", path, io),
        None => format!("{}: {}", path, err),
    }
}

/// Report the working directory.
pub struct PrintWorkingDirectory;

#[async_trait]
impl Tool for PrintWorkingDirectory {
    fn name(&self) -> &str {
        "pwd"
    }

    fn description(&self) -> &str {
        "Return the current working directory of the environment."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        Vec::new()
    }

    async fn execute(&self, _args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        Ok(ctx.working_dir.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    fn fixture() -> (tempfile::TempDir, ToolContext) {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        std::fs::write(dir.path().join(".env"), "").unwrap();
        let ctx = ToolContext::new(dir.path(), Duration::from_secs(5));
        (dir, ctx)
    }

    #[tokio::test]
    async fn list_defaults_to_working_dir() {
        let (_dir, ctx) = fixture();
        let out = ListDirectory.execute(&ToolArgs::default(), &ctx).await.unwrap();
        assert_eq!(out, ".env\na.txt\nb.txt\nsrc/");
    }

    #[tokio::test]
    async fn list_subdirectory() {
        let (_dir, ctx) = fixture();
        let out = ListDirectory
            .execute(&ToolArgs::from_pairs([("path", "src")]), &ctx)
            .await
            .unwrap();
        assert_eq!(out, "lib.rs\nnested/");
    }

    #[tokio::test]
    async fn list_missing_directory() {
        let (_dir, ctx) = fixture();
        let err = ListDirectory
            .execute(&ToolArgs::from_pairs([("path", "nope")]), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn tree_renders_hierarchy() {
        let (_dir, ctx) = fixture();
        let out = Tree.execute(&ToolArgs::from_pairs([("path", ".")]), &ctx).await.unwrap();
        let expected = ".\n├── a.txt\n├── b.txt\n└── src\n    ├── lib.rs\n    └── nested\n\n2 directories, 3 files";
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn tree_continues_lines_under_non_last_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/x")).unwrap();
        std::fs::write(dir.path().join("a/y.rs"), "").unwrap();
        std::fs::write(dir.path().join("a/x/deep.rs"), "").unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        let ctx = ToolContext::new(dir.path(), Duration::from_secs(5));

        let out = Tree.execute(&ToolArgs::from_pairs([("path", ".")]), &ctx).await.unwrap();
        let expected = ".\n├── a\n│   ├── x\n│   │   └── deep.rs\n│   └── y.rs\n└── b.txt\n\n2 directories, 3 files";
        assert_eq!(out, expected);
    }

    #[tokio::test]
    async fn tree_stops_at_depth_limit() {
        let dir = tempdir().unwrap();
        let deep = (1..=8).map(|i| format!("d{}", i)).collect::<Vec<_>>().join("/");
        std::fs::create_dir_all(dir.path().join(&deep)).unwrap();
        let ctx = ToolContext::new(dir.path(), Duration::from_secs(5));

        let out = Tree.execute(&ToolArgs::from_pairs([("path", ".")]), &ctx).await.unwrap();
        assert!(out.contains("d6"));
        assert!(!out.contains("d7"));
        assert!(out.ends_with("6 directories, 0 files"));
    }

    #[tokio::test]
    async fn tree_caps_rendered_entries() {
        let dir = tempdir().unwrap();
        for i in 0..MAX_TREE_ENTRIES + 100 {
            std::fs::write(dir.path().join(format!("f{:04}.txt", i)), "").unwrap();
        }
        let ctx = ToolContext::new(dir.path(), Duration::from_secs(5));

        let out = Tree.execute(&ToolArgs::from_pairs([("path", ".")]), &ctx).await.unwrap();
        assert!(out.contains("... [100 more entries not shown]"));
        assert!(out.contains("0 directories, 600 files"));
        assert!(!out.contains("f0599.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn tree_reports_unreadable_directories() {
        use std::os::unix::fs::PermissionsExt;

        // permission bits do not stop root
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::write(locked.join("secret.txt"), "").unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        let ctx = ToolContext::new(dir.path(), Duration::from_secs(5));

        let out = Tree.execute(&ToolArgs::from_pairs([("path", ".")]), &ctx).await;
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let out = out.unwrap();
        assert!(out.contains("└── locked"));
        assert!(out.contains("Unreadable entries:"));
        assert!(out.contains("locked: "));
        assert!(!out.contains("secret.txt"));
    }

    #[tokio::test]
    async fn list_output_is_capped() {
        let dir = tempdir().unwrap();
        for i in 0..400 {
            std::fs::write(dir.path().join(format!("a_rather_long_file_name_{:04}.txt", i)), "").unwrap();
        }
        let ctx = ToolContext::new(dir.path(), Duration::from_secs(5));

        let out = ListDirectory.execute(&ToolArgs::default(), &ctx).await.unwrap();
        assert!(out.ends_with("[output truncated]"));
        assert!(out.starts_with("a_rather_long_file_name_0000.txt"));
    }

    #[tokio::test]
    async fn tree_on_file_is_argument_error() {
        let (_dir, ctx) = fixture();
        let err = Tree
            .execute(&ToolArgs::from_pairs([("path", "a.txt")]), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Argument(_)));
    }

    #[tokio::test]
    async fn pwd_reports_context_dir() {
        let (dir, ctx) = fixture();
        let out = PrintWorkingDirectory.execute(&ToolArgs::default(), &ctx).await.unwrap();
        assert_eq!(out, dir.path().display().to_string());
    }
}
