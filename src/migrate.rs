//! The five-step migration pipeline.
//!
//! Each step completes one forward transition of the [`Stage`] machine.
//! Any failure halts the run, leaves the working copy on disk for
//! inspection, and performs no cleanup of already-created remote state:
//! if provisioning succeeded but a push failed, the GitLab project
//! stays for manual cleanup.
use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::RunConfig;
use crate::errors::{OverleafMoverError, OverleafMoverErrorKind};
use crate::git;
use crate::gitlab::{GitlabClient, GitlabProject};
use crate::latex;
use crate::overleaf::SourceRef;
use crate::pipeline;
use crate::stage::Stage;

/// One Overleaf-to-GitLab migration run.
#[derive(Debug)]
pub struct Migration {
    /// Resolved run configuration.
    config: RunConfig,

    /// The source project.
    source: SourceRef,

    /// Current pipeline state.
    stage: Stage,

    /// Current location of the working copy; moves on rename.
    workdir: PathBuf,

    /// Extracted document title, plain text.
    title: Option<String>,

    /// Sanitized repository name.
    slug: Option<String>,

    /// TeX entrypoint the pipeline will compile.
    primary_doc: Option<String>,

    /// Handle of the created GitLab project.
    project: Option<GitlabProject>,

    /// Where the published PDF will appear.
    pages_url: Option<String>,
}

impl Migration {
    /// Set up a run; nothing is executed yet.
    pub fn new(config: RunConfig, source: SourceRef) -> Self {
        let workdir = config.dir.join(&source.hash);
        Self {
            config,
            source,
            stage: Stage::Start,
            workdir,
            title: None,
            slug: None,
            primary_doc: None,
            project: None,
            pages_url: None,
        }
    }

    /// Current pipeline state.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to the next stage.
    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            self.stage = next;
        }
    }

    /// Execute the whole pipeline, front to back, one shot.
    ///
    /// # Errors
    /// The first stage failure aborts the run; the error carries the
    /// stage that was being reached and the error kind of that stage.
    pub async fn run(mut self) -> Result<Self, OverleafMoverError> {
        self.fetch()
            .map_err(|e| e.with_kind(OverleafMoverErrorKind::Fetch).with_stage(Stage::Fetched))?;
        self.advance();
        self.resolve_title()
            .map_err(|e| e.with_stage(Stage::TitleResolved))?;
        self.advance();
        self.provision().await.map_err(|e| {
            e.with_kind(OverleafMoverErrorKind::Provision)
                .with_stage(Stage::Provisioned)
        })?;
        self.advance();
        self.link_and_push()
            .map_err(|e| e.with_kind(OverleafMoverErrorKind::Push).with_stage(Stage::Linked))?;
        self.advance();
        self.install_pipeline().map_err(|e| {
            e.with_kind(OverleafMoverErrorKind::Push)
                .with_stage(Stage::PipelineInstalled)
        })?;
        self.advance();
        self.advance();
        debug_assert!(self.stage.is_terminal());
        Ok(self)
    }

    /// Step 1: clone the Overleaf project into `<dir>/<hash>`.
    fn fetch(&mut self) -> Result<(), OverleafMoverError> {
        info!(
            "Cloning '{}' into '{}'",
            self.source.git_url,
            self.workdir.display()
        );
        git::clone(&self.source.git_url, &self.workdir)?;
        Ok(())
    }

    /// Step 2: derive a sanitized name and rename the working copy.
    ///
    /// A missing `\title` is not an error; the project hash is the
    /// documented fallback (it is the last path segment of the source
    /// URL and already repository-safe).
    fn resolve_title(&mut self) -> Result<(), OverleafMoverError> {
        let title = match latex::find_title(&self.workdir)? {
            Some(title) => title,
            None => {
                info!("No \\title found, falling back to the project hash");
                self.source.hash.clone()
            }
        };
        // GitLab rejects names over its limit; the display name needs
        // the same cap the slug already gets.
        let title = latex::clamp_name(&title);
        let mut slug = latex::slugify(&title);
        if slug.is_empty() {
            slug = self.source.hash.clone();
        }
        info!("Title: '{title}' (repository name '{slug}')");
        self.primary_doc = Some(latex::primary_document(&self.workdir)?);
        if slug != self.source.hash {
            let new_dir = self.config.dir.join(&slug);
            if new_dir.exists() {
                return Err(OverleafMoverError::new(OverleafMoverErrorKind::Config).with_text(
                    format!("directory '{}' already exists", new_dir.display()),
                ));
            }
            fs::rename(&self.workdir, &new_dir)?;
            self.workdir = new_dir;
        }
        self.title = Some(title);
        self.slug = Some(slug);
        Ok(())
    }

    /// Step 3: create the private GitLab repository.
    ///
    /// Collision policy is fail-fast: an existing project under the
    /// same path aborts the run, no disambiguating suffix is tried.
    async fn provision(&mut self) -> Result<(), OverleafMoverError> {
        let slug = self.resolved_slug()?.to_string();
        let title = self.title.clone().unwrap_or_else(|| slug.clone());
        let main_tex = self.resolved_primary_doc()?.to_string();
        let client = GitlabClient::new(self.config.token.clone());
        let user = client.current_user().await?;
        let full_path = format!("{}/{slug}", user.username);
        let existing = client.get_project(&full_path).await?;
        ensure_path_free(existing.as_ref(), &full_path)?;
        info!("Creating private repository '{full_path}'");
        let project = client.create_project(&title, &slug).await?;
        info!("Created '{}'", project.web_url);
        self.pages_url = Some(pipeline::pages_url(&user.username, &slug, &main_tex));
        self.project = Some(project);
        Ok(())
    }

    /// Step 4: point the clone at the new repository and push history.
    fn link_and_push(&mut self) -> Result<(), OverleafMoverError> {
        let project = self.provisioned_project()?;
        let ssh_url = project.ssh_url_to_repo.clone();
        let repo = git::open(&self.workdir)?;
        git::set_remote(&repo, git::GITLAB_REMOTE, &ssh_url)?;
        git::add_push_urls(
            &repo,
            "origin",
            &[self.source.git_url.as_str(), ssh_url.as_str()],
        )?;
        info!("Pushing all branches to '{ssh_url}'");
        git::push_all_branches(&repo, git::GITLAB_REMOTE)?;
        Ok(())
    }

    /// Step 5: commit and push the pipeline definition and README.
    ///
    /// The platform's CI runner picks the definition up asynchronously;
    /// this tool does not wait for or report on the build.
    fn install_pipeline(&mut self) -> Result<(), OverleafMoverError> {
        let main_tex = self.resolved_primary_doc()?.to_string();
        let pages_url = self
            .pages_url
            .clone()
            .ok_or_else(|| step_order_error("pages url not resolved"))?;
        let written = pipeline::install(&self.workdir, &main_tex, &pages_url)?;
        let repo = git::open(&self.workdir)?;
        let paths: Vec<&Path> = written.iter().map(PathBuf::as_path).collect();
        git::commit_paths(&repo, &paths, "Add GitLab CI pipeline and README")?;
        git::push_all_branches(&repo, git::GITLAB_REMOTE)?;
        info!("Pipeline installed; the build will run and publish to '{pages_url}'");
        Ok(())
    }

    /// The sanitized name, set by step 2.
    fn resolved_slug(&self) -> Result<&str, OverleafMoverError> {
        self.slug
            .as_deref()
            .ok_or_else(|| step_order_error("title not resolved"))
    }

    /// The TeX entrypoint, set by step 2.
    fn resolved_primary_doc(&self) -> Result<&str, OverleafMoverError> {
        self.primary_doc
            .as_deref()
            .ok_or_else(|| step_order_error("primary document not resolved"))
    }

    /// The created project handle, set by step 3.
    fn provisioned_project(&self) -> Result<&GitlabProject, OverleafMoverError> {
        self.project
            .as_ref()
            .ok_or_else(|| step_order_error("repository not provisioned"))
    }
}

/// The name-collision policy: fail fast.
///
/// An occupied project path aborts the run with a provision error; no
/// disambiguating suffix is ever tried, so a re-run against the same
/// title fails loudly instead of creating a near-duplicate repository.
fn ensure_path_free(
    existing: Option<&GitlabProject>,
    full_path: &str,
) -> Result<(), OverleafMoverError> {
    match existing {
        Some(_) => Err(
            OverleafMoverError::new(OverleafMoverErrorKind::Provision).with_text(format!(
                "project '{full_path}' already exists; delete or rename it and re-run"
            )),
        ),
        None => Ok(()),
    }
}

/// Invariant violation: a step ran before its input was produced.
fn step_order_error(what: &str) -> OverleafMoverError {
    OverleafMoverError::new(OverleafMoverErrorKind::Config)
        .with_text(format!("pipeline step out of order: {what}"))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    /// A migration against a temp directory, not yet run.
    fn migration(dir: &TempDir, hash: &str) -> Migration {
        let config = RunConfig {
            token: "glpat-test".to_string(),
            dir: dir.path().to_path_buf(),
        };
        let source = SourceRef::parse(hash).unwrap();
        Migration::new(config, source)
    }

    #[test]
    fn starts_at_stage_start_with_hash_workdir() {
        let dir = TempDir::new().unwrap();
        let m = migration(&dir, "5f3b2a1c9d8e7f");
        assert_eq!(m.stage(), Stage::Start);
        assert_eq!(m.workdir, dir.path().join("5f3b2a1c9d8e7f"));
    }

    #[tokio::test]
    async fn occupied_target_directory_fails_the_fetch_stage() {
        let dir = TempDir::new().unwrap();
        let m = migration(&dir, "5f3b2a1c9d8e7f");
        let target = dir.path().join("5f3b2a1c9d8e7f");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("stale.tex"), "leftover").unwrap();
        let err = m.run().await.unwrap_err();
        assert_eq!(err.kind(), OverleafMoverErrorKind::Fetch);
        assert_eq!(err.stage(), Some(Stage::Fetched));
    }

    #[test]
    fn resolve_title_renames_working_copy_to_slug() {
        let dir = TempDir::new().unwrap();
        let mut m = migration(&dir, "5f3b2a1c9d8e7f");
        std::fs::create_dir(&m.workdir).unwrap();
        let mut f = File::create(m.workdir.join("main.tex")).unwrap();
        f.write_all(b"\\title{My Thesis 2024}\n").unwrap();
        m.resolve_title().unwrap();
        assert_eq!(m.slug.as_deref(), Some("my-thesis-2024"));
        assert_eq!(m.title.as_deref(), Some("My Thesis 2024"));
        assert_eq!(m.workdir, dir.path().join("my-thesis-2024"));
        assert!(m.workdir.is_dir());
        assert!(!dir.path().join("5f3b2a1c9d8e7f").exists());
    }

    #[test]
    fn resolve_title_falls_back_to_hash_without_rename() {
        let dir = TempDir::new().unwrap();
        let mut m = migration(&dir, "5f3b2a1c9d8e7f");
        std::fs::create_dir(&m.workdir).unwrap();
        m.resolve_title().unwrap();
        assert_eq!(m.slug.as_deref(), Some("5f3b2a1c9d8e7f"));
        assert_eq!(m.workdir, dir.path().join("5f3b2a1c9d8e7f"));
    }

    #[test]
    fn resolve_title_refuses_occupied_slug_directory() {
        let dir = TempDir::new().unwrap();
        let mut m = migration(&dir, "5f3b2a1c9d8e7f");
        std::fs::create_dir(&m.workdir).unwrap();
        let mut f = File::create(m.workdir.join("main.tex")).unwrap();
        f.write_all(b"\\title{My Thesis 2024}\n").unwrap();
        std::fs::create_dir(dir.path().join("my-thesis-2024")).unwrap();
        assert!(m.resolve_title().is_err());
    }

    /// A project handle as GitLab would return it.
    fn existing_project(full_path: &str) -> GitlabProject {
        GitlabProject {
            id: 42,
            name: "My Thesis 2024".to_string(),
            path: "my-thesis-2024".to_string(),
            path_with_namespace: full_path.to_string(),
            web_url: format!("https://gitlab.com/{full_path}"),
            ssh_url_to_repo: format!("git@gitlab.com:{full_path}.git"),
            http_url_to_repo: format!("https://gitlab.com/{full_path}.git"),
        }
    }

    #[test]
    fn occupied_path_fails_fast_without_suffix() {
        let full_path = "someone/my-thesis-2024";
        let project = existing_project(full_path);
        let err = ensure_path_free(Some(&project), full_path).unwrap_err();
        assert_eq!(err.kind(), OverleafMoverErrorKind::Provision);
        let msg = err.to_string();
        assert!(msg.contains("someone/my-thesis-2024"));
        assert!(msg.contains("already exists"));
        assert!(!msg.contains("my-thesis-2024-1"));
    }

    #[test]
    fn free_path_passes_the_collision_check() {
        assert!(ensure_path_free(None, "someone/my-thesis-2024").is_ok());
    }

    #[test]
    fn resolved_title_is_clamped_for_the_platform() {
        let dir = TempDir::new().unwrap();
        let mut m = migration(&dir, "5f3b2a1c9d8e7f");
        std::fs::create_dir(&m.workdir).unwrap();
        let long_title = format!("\\title{{{}}}\n", "Word ".repeat(80));
        let mut f = File::create(m.workdir.join("main.tex")).unwrap();
        f.write_all(long_title.as_bytes()).unwrap();
        m.resolve_title().unwrap();
        let title = m.title.as_deref().unwrap();
        assert!(title.len() <= 255);
        let slug = m.slug.as_deref().unwrap();
        assert!(slug.len() <= 255);
    }

    #[test]
    fn out_of_order_steps_are_rejected() {
        let dir = TempDir::new().unwrap();
        let m = migration(&dir, "5f3b2a1c9d8e7f");
        assert!(m.resolved_slug().is_err());
        assert!(m.provisioned_project().is_err());
    }
}
