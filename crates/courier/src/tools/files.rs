use serde::Deserialize;
use serde_json::json;
use tokio::fs;

use super::ToolContext;
use crate::errors::ToolResult;
use crate::models::tool::Tool;

pub fn list_files_in_dir_tool() -> Tool {
    Tool::new(
        "list_files_in_dir",
        "List the files in a directory (defaults to the current one)",
        json!({
            "type": "object",
            "properties": {
                "directory": {"type": "string", "description": "Directory to list (optional)"}
            },
            "required": []
        }),
    )
}

pub fn read_file_tool() -> Tool {
    Tool::new(
        "read_file",
        "Read the content of a file",
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path of the file"}
            },
            "required": ["path"]
        }),
    )
}

pub fn edit_file_tool() -> Tool {
    Tool::new(
        "edit_file",
        "Edit a file by replacing text, or create it when it does not exist",
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path of the file"},
                "prev_text": {"type": "string", "description": "Text to replace (optional)"},
                "new_text": {"type": "string", "description": "New text"}
            },
            "required": ["path", "new_text"]
        }),
    )
}

#[derive(Debug, Deserialize)]
pub struct ListFilesArgs {
    #[serde(default = "current_dir")]
    pub directory: String,
}

fn current_dir() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ReadFileArgs {
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct EditFileArgs {
    pub path: String,
    #[serde(default)]
    pub prev_text: String,
    #[serde(default)]
    pub new_text: String,
}

/// Entry names of a directory as `{"files": [...]}`, sorted
pub async fn list_files_in_dir(ctx: &ToolContext, args: ListFilesArgs) -> ToolResult<String> {
    let directory = ctx.resolve_path(&args.directory);
    let mut entries = fs::read_dir(&directory).await?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        files.push(entry.file_name().to_string_lossy().into_owned());
    }
    files.sort();

    Ok(json!({ "files": files }).to_string())
}

pub async fn read_file(ctx: &ToolContext, args: ReadFileArgs) -> ToolResult<String> {
    let path = ctx.resolve_path(&args.path);
    Ok(fs::read_to_string(&path).await?)
}

/// Replace every occurrence of `prev_text` in an existing file, or write `new_text` as the
/// whole file when there is nothing to replace.
pub async fn edit_file(ctx: &ToolContext, args: EditFileArgs) -> ToolResult<String> {
    let path = ctx.resolve_path(&args.path);
    let existed = fs::try_exists(&path).await?;

    if existed && !args.prev_text.is_empty() {
        let content = fs::read_to_string(&path).await?;
        if !content.contains(&args.prev_text) {
            return Ok(format!(
                "Text '{}' not found in file {}",
                args.prev_text, args.path
            ));
        }
        fs::write(&path, content.replace(&args.prev_text, &args.new_text)).await?;
        return Ok(format!("File {} edited successfully", args.path));
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(&path, &args.new_text).await?;
    Ok(format!("File {} created successfully", args.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> ToolContext {
        ToolContext::new(dir.path())
    }

    fn edit(path: &str, prev_text: &str, new_text: &str) -> EditFileArgs {
        EditFileArgs {
            path: path.to_string(),
            prev_text: prev_text.to_string(),
            new_text: new_text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_files_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let output = list_files_in_dir(
            &context(&dir),
            ListFilesArgs {
                directory: ".".into(),
            },
        )
        .await
        .unwrap();

        let parsed: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, json!({"files": ["a.txt", "b.txt", "sub"]}));
    }

    #[tokio::test]
    async fn test_list_files_default_directory() {
        let args: ListFilesArgs = serde_json::from_value(json!({})).unwrap();
        assert_eq!(args.directory, ".");
    }

    #[tokio::test]
    async fn test_list_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let result = list_files_in_dir(
            &context(&dir),
            ListFilesArgs {
                directory: "nope".into(),
            },
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.md"), "# Notes\nsome text").unwrap();

        let content = read_file(
            &context(&dir),
            ReadFileArgs {
                path: "notes.md".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(content, "# Notes\nsome text");
    }

    #[tokio::test]
    async fn test_edit_creates_file_and_parents() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let result = edit_file(&ctx, edit("docs/new/readme.txt", "", "hello"))
            .await
            .unwrap();
        assert_eq!(result, "File docs/new/readme.txt created successfully");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("docs/new/readme.txt")).unwrap(),
            "hello"
        );
    }

    #[tokio::test]
    async fn test_edit_replaces_all_occurrences() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        std::fs::write(dir.path().join("a.txt"), "foo bar foo").unwrap();

        let result = edit_file(&ctx, edit("a.txt", "foo", "baz")).await.unwrap();
        assert_eq!(result, "File a.txt edited successfully");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "baz bar baz"
        );
    }

    #[tokio::test]
    async fn test_edit_missing_text_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        std::fs::write(dir.path().join("a.txt"), "foo").unwrap();

        let result = edit_file(&ctx, edit("a.txt", "qux", "baz")).await.unwrap();
        assert_eq!(result, "Text 'qux' not found in file a.txt");
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "foo");
    }

    #[tokio::test]
    async fn test_edit_without_prev_text_overwrites() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        std::fs::write(dir.path().join("a.txt"), "old").unwrap();

        let result = edit_file(&ctx, edit("a.txt", "", "new")).await.unwrap();
        assert_eq!(result, "File a.txt created successfully");
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_edit_prev_text_on_missing_file_creates_it() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        let result = edit_file(&ctx, edit("fresh.txt", "anything", "content"))
            .await
            .unwrap();
        assert_eq!(result, "File fresh.txt created successfully");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("fresh.txt")).unwrap(),
            "content"
        );
    }
}
