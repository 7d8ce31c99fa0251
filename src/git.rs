//! git2 plumbing: clone, remotes, commit, push.
use std::path::Path;

use git2::{
    build::RepoBuilder, BranchType, Cred, CredentialType, FetchOptions, PushOptions,
    RemoteCallbacks, Repository, Signature,
};

use crate::errors::{OverleafMoverError, OverleafMoverErrorKind};

/// Name of the remote pointing at the new GitLab repository.
pub(crate) const GITLAB_REMOTE: &str = "gitlab";

/// Fallback committer identity when the repository has none configured.
const FALLBACK_IDENT: &str = "overleaf-mover";

/// Credential callbacks for both transports.
///
/// SSH remotes authenticate via the ssh-agent; https remotes go through
/// the configured git credential helper. Origin credentials are thus
/// handled entirely out-of-band.
fn callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|url, username_from_url, allowed| {
        if allowed.contains(CredentialType::SSH_KEY) {
            let username = username_from_url.unwrap_or("git");
            return Cred::ssh_key_from_agent(username);
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let config = git2::Config::open_default()?;
            return Cred::credential_helper(&config, url, username_from_url);
        }
        Cred::default()
    });
    callbacks
}

/// Clone `url` into `dest`.
///
/// An existing empty directory is an acceptable target, as with git
/// itself.
///
/// # Errors
/// A fetch error when `dest` already exists and is non-empty or the
/// clone fails.
pub fn clone(url: &str, dest: &Path) -> Result<Repository, OverleafMoverError> {
    if dest.exists() {
        let mut entries = dest.read_dir().map_err(|e| {
            OverleafMoverError::new(OverleafMoverErrorKind::Fetch)
                .with_text(format!("target '{}' is not a directory", dest.display()))
                .with_source(e)
        })?;
        if entries.next().is_some() {
            return Err(OverleafMoverError::new(OverleafMoverErrorKind::Fetch).with_text(
                format!(
                    "target directory '{}' already exists and is not empty",
                    dest.display()
                ),
            ));
        }
    }
    let mut fetch_opts = FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks());
    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_opts);
    let repo = builder
        .clone(url, dest)
        .map_err(|e| OverleafMoverError::from(e).with_kind(OverleafMoverErrorKind::Fetch))?;
    Ok(repo)
}

/// Open an existing working copy.
///
/// # Errors
/// A git error when `path` holds no repository.
pub fn open(path: &Path) -> Result<Repository, OverleafMoverError> {
    Ok(Repository::open(path)?)
}

/// Register `url` as remote `name`, replacing any prior remote of that
/// name.
///
/// # Errors
/// A git error when the remote cannot be (re)created.
pub fn set_remote(repo: &Repository, name: &str, url: &str) -> Result<(), OverleafMoverError> {
    if repo.find_remote(name).is_ok() {
        repo.remote_delete(name)?;
    }
    repo.remote(name, url)?;
    Ok(())
}

/// Add explicit push URLs to a remote.
///
/// Used to make `origin` push to both the Overleaf project and the new
/// GitLab repository, so a later manual `git push` updates both.
///
/// # Errors
/// A git error when the remote configuration cannot be written.
pub fn add_push_urls(
    repo: &Repository,
    name: &str,
    urls: &[&str],
) -> Result<(), OverleafMoverError> {
    let mut config = repo.config()?;
    let key = format!("remote.{name}.pushurl");
    for url in urls {
        config.set_multivar(&key, "^$", url)?;
    }
    Ok(())
}

/// Push every local branch to `remote_name`, without forcing.
///
/// # Errors
/// A push error on authentication rejection, network failure, or a
/// non-fast-forward rejection.
pub fn push_all_branches(repo: &Repository, remote_name: &str) -> Result<(), OverleafMoverError> {
    let mut refspecs: Vec<String> = Vec::new();
    for branch in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = branch?;
        if let Some(name) = branch.get().name() {
            refspecs.push(format!("{name}:{name}"));
        }
    }
    let refspecs: Vec<&str> = refspecs.iter().map(String::as_str).collect();
    let mut remote = repo.find_remote(remote_name)?;
    let mut opts = PushOptions::new();
    opts.remote_callbacks(callbacks());
    remote
        .push(&refspecs, Some(&mut opts))
        .map_err(|e| OverleafMoverError::from(e).with_kind(OverleafMoverErrorKind::Push))?;
    Ok(())
}

/// Stage `paths` (relative to the worktree root) and commit them onto
/// HEAD.
///
/// # Errors
/// A git error when staging or committing fails.
pub fn commit_paths(
    repo: &Repository,
    paths: &[&Path],
    message: &str,
) -> Result<(), OverleafMoverError> {
    let mut index = repo.index()?;
    for path in paths {
        index.add_path(path)?;
    }
    index.write()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;
    let signature = repo
        .signature()
        .or_else(|_| Signature::now(FALLBACK_IDENT, "overleaf-mover@localhost"))?;
    let parent = repo.head()?.peel_to_commit()?;
    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &[&parent],
    )?;
    Ok(())
}
