//! render::renderer
//!
//! Source file → [`ContentTree`].
//!
//! `.jsonnet` files are evaluated through the configured
//! [`TemplateEvaluator`]; every other file is read as JSON. File names
//! containing `.template.` also receive `template=true`,
//! `github_repo_owner` and `github_repo_name`, derived from
//! `GITHUB_REPOSITORY`. Variables given explicitly win over derived ones.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use super::content::ContentTree;
use super::template::TemplateEvaluator;
use super::RenderError;
use crate::core::config::Settings;

const TEMPLATE_EXTENSION: &str = "jsonnet";
const TEMPLATE_MARKER: &str = ".template.";

/// Renders source files into content trees.
pub struct Renderer {
    evaluator: Box<dyn TemplateEvaluator>,
    vars: BTreeMap<String, String>,
    settings: Settings,
}

impl Renderer {
    pub fn new(evaluator: Box<dyn TemplateEvaluator>, settings: &Settings) -> Self {
        Self {
            evaluator,
            vars: BTreeMap::new(),
            settings: settings.clone(),
        }
    }

    /// Add one external variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Add several external variables.
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Render `path` into an expanded content tree.
    ///
    /// # Errors
    ///
    /// - `RenderError::Read` if a data file cannot be read
    /// - `RenderError::Config` if a `.template.` file is rendered without
    ///   `GITHUB_REPOSITORY`
    /// - evaluator errors for templates
    /// - `RenderError::Parse` if the result is not a content tree
    pub fn render_file(&self, path: &Path) -> Result<ContentTree, RenderError> {
        let bytes = if is_template(path) {
            let vars = self.template_vars(path)?;
            debug!(
                path = %path.display(),
                evaluator = self.evaluator.name(),
                vars = vars.len(),
                "evaluating template"
            );
            self.evaluator.evaluate(path, &vars)?.into_bytes()
        } else {
            std::fs::read(path).map_err(|e| RenderError::Read {
                path: path.to_path_buf(),
                source: e,
            })?
        };

        let mut tree = ContentTree::from_json(&bytes).map_err(|e| RenderError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        tree.expand_kustomize();

        debug!(
            path = %path.display(),
            files = tree.files.len(),
            aggregations = tree.kustomize.len(),
            "rendered"
        );
        Ok(tree)
    }

    fn template_vars(&self, path: &Path) -> Result<BTreeMap<String, String>, RenderError> {
        let mut vars = BTreeMap::new();

        if has_template_marker(path) {
            let (owner, name) = self.settings.repository_owner_and_name()?;
            vars.insert("template".to_string(), "true".to_string());
            vars.insert("github_repo_owner".to_string(), owner);
            vars.insert("github_repo_name".to_string(), name);
        }

        vars.extend(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(vars)
    }
}

fn is_template(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(TEMPLATE_EXTENSION)
}

fn has_template_marker(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.contains(TEMPLATE_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ConfigError, REPOSITORY_ENV};
    use crate::render::Content;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Returns fixed output and records the variables it was given.
    struct FakeEvaluator {
        output: String,
        seen: Arc<Mutex<BTreeMap<String, String>>>,
    }

    impl TemplateEvaluator for FakeEvaluator {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn evaluate(
            &self,
            _path: &Path,
            vars: &BTreeMap<String, String>,
        ) -> Result<String, RenderError> {
            *self.seen.lock().unwrap() = vars.clone();
            Ok(self.output.clone())
        }
    }

    fn renderer(
        output: &str,
        settings: &Settings,
    ) -> (Renderer, Arc<Mutex<BTreeMap<String, String>>>) {
        let seen = Arc::new(Mutex::new(BTreeMap::new()));
        let evaluator = FakeEvaluator {
            output: output.to_string(),
            seen: Arc::clone(&seen),
        };
        (Renderer::new(Box::new(evaluator), settings), seen)
    }

    fn with_repository(value: &str) -> Settings {
        let value = value.to_string();
        Settings::from_lookup("GITHUB_TOKEN", move |name| {
            (name == REPOSITORY_ENV).then(|| value.clone())
        })
    }

    const SCENARIO: &str =
        r#"{"$files": {"a.txt": "a\n"}, "$kustomize": {"dir": {"x.yaml": {"k":"v"}}}}"#;

    #[test]
    fn template_scenario_renders_and_expands() {
        let (renderer, _) = renderer(SCENARIO, &Settings::default());
        let tree = renderer.render_file(Path::new("t.jsonnet")).unwrap();

        assert_eq!(tree.files.len(), 2);
        assert_eq!(tree.files["a.txt"], Content::Text("a\n".into()));
        assert_eq!(tree.files["dir/x.yaml"], Content::Data(json!({"k": "v"})));
        assert_eq!(tree.kustomize["dir"]["x.yaml"], None);
    }

    #[test]
    fn plain_json_is_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        std::fs::write(&path, SCENARIO).unwrap();

        let (renderer, seen) = renderer("unused", &Settings::default());
        let tree = renderer.render_file(&path).unwrap();

        assert!(tree.files.contains_key("dir/x.yaml"));
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_data_file_is_read_error() {
        let (renderer, _) = renderer("{}", &Settings::default());
        let err = renderer
            .render_file(Path::new("/nonexistent/tree.json"))
            .unwrap_err();
        assert!(matches!(err, RenderError::Read { .. }));
    }

    #[test]
    fn invalid_output_is_parse_error() {
        let (renderer, _) = renderer("not json", &Settings::default());
        let err = renderer.render_file(Path::new("t.jsonnet")).unwrap_err();
        assert!(matches!(err, RenderError::Parse { .. }));
    }

    #[test]
    fn user_vars_are_passed_through() {
        let (renderer, seen) = renderer("{}", &Settings::default());
        renderer
            .with_vars([("project", "myproject"), ("env", "prod")])
            .render_file(Path::new("t.jsonnet"))
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen["project"], "myproject");
        assert!(!seen.contains_key("template"));
    }

    mod template_marker {
        use super::*;

        #[test]
        fn derives_repository_vars() {
            let (renderer, seen) = renderer("{}", &with_repository("mumoshu/example"));
            renderer
                .render_file(Path::new("app.template.jsonnet"))
                .unwrap();

            let seen = seen.lock().unwrap();
            assert_eq!(seen["template"], "true");
            assert_eq!(seen["github_repo_owner"], "mumoshu");
            assert_eq!(seen["github_repo_name"], "example");
        }

        #[test]
        fn explicit_vars_override_derived() {
            let (renderer, seen) = renderer("{}", &with_repository("mumoshu/example"));
            renderer
                .with_var("github_repo_name", "other")
                .render_file(Path::new("app.template.jsonnet"))
                .unwrap();

            assert_eq!(seen.lock().unwrap()["github_repo_name"], "other");
        }

        #[test]
        fn missing_repository_is_config_error() {
            let (renderer, _) = renderer("{}", &Settings::default());
            let err = renderer
                .render_file(Path::new("app.template.jsonnet"))
                .unwrap_err();

            assert!(matches!(
                err,
                RenderError::Config(ConfigError::MissingEnv {
                    env: REPOSITORY_ENV,
                    ..
                })
            ));
        }

        #[test]
        fn marker_in_directory_name_is_ignored() {
            let (renderer, seen) = renderer("{}", &Settings::default());
            renderer
                .render_file(Path::new("x.template.d/app.jsonnet"))
                .unwrap();
            assert!(seen.lock().unwrap().is_empty());
        }
    }
}
