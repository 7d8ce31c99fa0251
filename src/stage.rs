//! The pipeline state machine.
//!
//! The migration walks `Start → Fetched → TitleResolved → Provisioned →
//! Linked → PipelineInstalled → Done`, one forward transition per step,
//! never backwards, never twice.

/// A state of the migration pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing has happened yet.
    Start,

    /// The source project is cloned to local storage.
    Fetched,

    /// A sanitized project name has been derived.
    TitleResolved,

    /// The destination repository exists.
    Provisioned,

    /// Local history has been pushed to the destination.
    Linked,

    /// The build/publish pipeline definition is committed and pushed.
    PipelineInstalled,

    /// The run completed.
    Done,
}

impl Stage {
    /// The next stage, or `None` from [`Stage::Done`].
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Start => Some(Stage::Fetched),
            Stage::Fetched => Some(Stage::TitleResolved),
            Stage::TitleResolved => Some(Stage::Provisioned),
            Stage::Provisioned => Some(Stage::Linked),
            Stage::Linked => Some(Stage::PipelineInstalled),
            Stage::PipelineInstalled => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    /// Whether every piece of work is behind this stage.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::Fetched => "fetched",
            Stage::TitleResolved => "title-resolved",
            Stage::Provisioned => "provisioned",
            Stage::Linked => "linked",
            Stage::PipelineInstalled => "pipeline-installed",
            Stage::Done => "done",
        };
        write!(f, "{name}")
    }
}
