//! Error handling for the overleaf-mover crate.
use std::{error::Error as StdError, fmt};

use crate::stage::Stage;

/// Error type for the overleaf-mover crate.
#[derive(Debug)]
pub struct OverleafMoverError {
    /// Inner error.
    inner: Box<Inner>,
}

/// Type alias for a boxed error.
pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Inner error type for the overleaf-mover crate.
#[derive(Debug)]
struct Inner {
    /// Error kind.
    kind: OverleafMoverErrorKind,

    /// Pipeline stage that was being reached when the error occurred.
    stage: Option<Stage>,

    /// Source error.
    source: Option<BoxError>,

    /// Additional context text.
    text: Option<String>,
}

/// Kinds of errors raised by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OverleafMoverErrorKind {
    /// Missing or invalid run configuration (credential, source reference).
    Config,

    /// Cloning the source project failed.
    Fetch,

    /// Creating the destination repository failed.
    Provision,

    /// Pushing to the destination repository failed.
    Push,

    /// Error surfaced by the reqwest crate.
    Reqwest,

    /// Error surfaced by serde.
    Serde,

    /// Error surfaced by git2.
    Git2,

    /// Error surfaced by the filesystem.
    Io,
}

impl fmt::Display for OverleafMoverErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverleafMoverErrorKind::Config => "config",
            OverleafMoverErrorKind::Fetch => "fetch",
            OverleafMoverErrorKind::Provision => "provision",
            OverleafMoverErrorKind::Push => "push",
            OverleafMoverErrorKind::Reqwest => "http",
            OverleafMoverErrorKind::Serde => "serde",
            OverleafMoverErrorKind::Git2 => "git",
            OverleafMoverErrorKind::Io => "io",
        };
        write!(f, "{name}")
    }
}

impl OverleafMoverError {
    /// Create a new error.
    pub(crate) fn new(kind: OverleafMoverErrorKind) -> Self {
        Self {
            inner: Box::new(Inner {
                kind,
                stage: None,
                source: None,
                text: None,
            }),
        }
    }

    /// Attach context text to the error.
    pub(crate) fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.inner.text = Some(text.into());
        self
    }

    /// Attach a source error.
    pub(crate) fn with_source<E: Into<BoxError>>(mut self, source: E) -> Self {
        self.inner.source = Some(source.into());
        self
    }

    /// Re-kind a transport error into the pipeline kind it occurred under.
    pub(crate) fn with_kind(mut self, kind: OverleafMoverErrorKind) -> Self {
        self.inner.kind = kind;
        self
    }

    /// Record the stage that was being reached when the error occurred.
    pub(crate) fn with_stage(mut self, stage: Stage) -> Self {
        self.inner.stage = Some(stage);
        self
    }

    /// The kind of this error.
    #[cfg(test)]
    pub(crate) fn kind(&self) -> OverleafMoverErrorKind {
        self.inner.kind
    }

    /// The stage this error was recorded in, if any.
    #[cfg(test)]
    pub(crate) fn stage(&self) -> Option<Stage> {
        self.inner.stage
    }
}

impl fmt::Display for OverleafMoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error", self.inner.kind)?;
        if let Some(stage) = &self.inner.stage {
            write!(f, " (while reaching stage '{stage}')")?;
        }
        if let Some(text) = &self.inner.text {
            write!(f, ": {text}")?;
        }
        if let Some(source) = &self.inner.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for OverleafMoverError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| &**e as _)
    }
}

impl From<reqwest::Error> for OverleafMoverError {
    fn from(e: reqwest::Error) -> Self {
        Self::new(OverleafMoverErrorKind::Reqwest).with_source(e)
    }
}

impl From<serde_json::Error> for OverleafMoverError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(OverleafMoverErrorKind::Serde).with_source(e)
    }
}

impl From<git2::Error> for OverleafMoverError {
    fn from(e: git2::Error) -> Self {
        Self::new(OverleafMoverErrorKind::Git2).with_source(e)
    }
}

impl From<std::io::Error> for OverleafMoverError {
    fn from(e: std::io::Error) -> Self {
        Self::new(OverleafMoverErrorKind::Io).with_source(e)
    }
}
