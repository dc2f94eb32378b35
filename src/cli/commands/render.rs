//! render command - Print the content tree of a template or data file

use crate::cli::args::SourceArgs;
use crate::cli::Context;
use crate::core::config::{Settings, DEFAULT_TOKEN_ENV};
use crate::render::{ContentTree, JsonnetCli, Renderer};
use anyhow::{Context as _, Result};

/// Render `source` and print the tree as pretty JSON on stdout.
pub fn render(ctx: &Context, source: &SourceArgs) -> Result<()> {
    let settings = Settings::from_env(DEFAULT_TOKEN_ENV);
    let tree = render_tree(source, &settings)?;

    let json = serde_json::to_string_pretty(&tree).context("failed to serialize content tree")?;
    ctx.printer().result(json)?;
    Ok(())
}

/// Render `source` with the jsonnet tool it names.
pub fn render_tree(source: &SourceArgs, settings: &Settings) -> Result<ContentTree> {
    let renderer = Renderer::new(Box::new(JsonnetCli::new(&source.jsonnet_bin)), settings)
        .with_vars(source.vars.iter().cloned());

    renderer
        .render_file(&source.file)
        .with_context(|| format!("failed to render file {}", source.file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn source(file: PathBuf) -> SourceArgs {
        SourceArgs {
            file,
            vars: Vec::new(),
            jsonnet_bin: PathBuf::from("jsonnet"),
        }
    }

    #[test]
    fn data_file_renders_without_jsonnet() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.json");
        std::fs::write(&file, r#"{"$files": {"a.yaml": {"k": "v"}}}"#).unwrap();

        let tree = render_tree(&source(file), &Settings::default()).unwrap();
        assert_eq!(tree.files.len(), 1);
    }

    #[test]
    fn missing_file_names_the_file() {
        let err = render_tree(&source(PathBuf::from("/nonexistent/app.json")), &Settings::default())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("failed to render file /nonexistent/app.json"));
    }
}
