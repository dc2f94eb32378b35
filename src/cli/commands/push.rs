//! push command - Render a file and deliver the result to a store

use crate::cli::args::PushArgs;
use crate::cli::commands::render::render_tree;
use crate::cli::Context;
use crate::core::config::{load_delegate, Delegate, GitTarget, PullRequestTarget, Settings};
use crate::core::naming::slugify;
use crate::push::{deliver, PushOptions};
use crate::store::{self, CommitOutcome, StoreOptions};
use crate::ui::output::format_list;
use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use std::path::Path;

/// Render `args.source` and deliver it.
pub fn push(ctx: &Context, args: &PushArgs) -> Result<()> {
    let mut out = ctx.printer();
    let settings = Settings::from_env(&args.github_token_env);
    if settings.token.is_none() {
        out.warn(format!(
            "{} is not set; delivery to a git repository will fail",
            args.github_token_env
        ))?;
    }

    let delegate = target(args)?;
    let tree = render_tree(&args.source, &settings)?;
    let id = run_id(&args.source.file);

    let options = PushOptions {
        subject: args.subject.clone(),
        body: args.body.clone(),
        kustomize_bin: args
            .kustomize_bin
            .clone()
            .or_else(|| settings.kustomize_bin.clone()),
        store: StoreOptions {
            work_dir: args.work_dir.clone(),
            dry_run: args.dry_run,
        },
    };

    let mut store = store::make(&id, Utc::now(), delegate.as_ref(), &settings, &options.store)
        .context("failed to prepare the target store")?;
    let delivery = deliver(&tree, store.as_mut(), &options)
        .with_context(|| format!("failed to push the changes to the {} store", store.name()))?;

    if let Some(diff) = &delivery.pending {
        out.result(diff.trim_end())?;
    }
    out.detail(format!(
        "wrote:\n{}",
        format_list(&delivery.written.added_or_modified_files, "  ")
    ))?;

    match &delivery.outcome {
        CommitOutcome::NoChanges => out.status("no changes to deliver")?,
        outcome => out.status(outcome)?,
    }
    Ok(())
}

/// The delivery target from `--config` with the command-line overrides applied.
///
/// `None` means local delivery.
pub fn target(args: &PushArgs) -> Result<Option<Delegate>> {
    let mut delegate = match &args.config {
        Some(path) => load_delegate(path)
            .with_context(|| format!("failed to load target file {}", path.display()))?,
        None => Delegate::default(),
    };

    if let Some(repo) = &args.repo {
        match &mut delegate.git {
            Some(git) => git.repo = repo.clone(),
            None => {
                delegate.git = Some(GitTarget {
                    repo: repo.clone(),
                    push: true,
                    ..Default::default()
                })
            }
        }
    }

    if let Some(branch) = &args.branch {
        match &mut delegate.git {
            Some(git) => git.branch = Some(branch.clone()),
            None => bail!("--branch requires --repo or a [git] target"),
        }
    }

    if args.pull_request {
        delegate.pull_request = Some(PullRequestTarget::default());
    }

    if delegate == Delegate::default() {
        return Ok(None);
    }
    delegate.validate()?;
    Ok(Some(delegate))
}

/// Store id for `file`: the slug of its stem.
fn run_id(file: &Path) -> String {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let slug = slugify(&stem);
    if slug.is_empty() {
        "gitimpart".to_string()
    } else {
        slug
    }
}
