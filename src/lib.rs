//! # overleaf-mover
//!
//! Move an Overleaf project to a new GitLab repository with a LaTeX
//! build pipeline.
//!
//! The tool clones the Overleaf project, derives a repository name from
//! its `\title{...}`, creates a private GitLab repository, pushes the
//! full history, and installs a `.gitlab-ci.yml` that compiles the
//! document and publishes the PDF through GitLab Pages.
//!
//! ## Usage
//!
//! ```txt
//! Usage: overleaf-mover [OPTIONS] <SOURCE>
//!
//! Arguments:
//!   <SOURCE>  Overleaf project URL (web or git) or project hash
//!
//! Options:
//!   -d, --dir <DIR>  Directory where the project will be cloned [default: .]
//!   -v, --verbose... Verbose mode (-v, -vv, -vvv)
//!   -h, --help       Print help
//! ```
//!
//! The GitLab access token is read from `GITLAB_TOKEN` (a `.env` file
//! works); otherwise the tool prompts for it without echo.
//!
//! The run is one-shot: no retries, no rollback. A failure after the
//! repository was created leaves it in place for manual cleanup.

#![warn(clippy::all, rust_2018_idioms)]
#![deny(
    missing_docs,
    clippy::all,
    clippy::missing_docs_in_private_items,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![warn(clippy::multiple_crate_versions)]

pub(crate) mod cli;
pub(crate) mod config;
pub(crate) mod errors;
pub(crate) mod git;
pub(crate) mod gitlab;
pub(crate) mod latex;
pub(crate) mod migrate;
pub(crate) mod overleaf;
pub(crate) mod pipeline;
pub(crate) mod stage;

pub use cli::{overleaf_mover_main, OverleafMoverCli};
pub use config::{RunConfig, TOKEN_ENV};
pub use errors::OverleafMoverError;
pub use gitlab::{GitlabClient, GitlabProject, GitlabUser};
pub use migrate::Migration;
pub use overleaf::SourceRef;
pub use stage::Stage;
