//! Overleaf source references.
use url::Url;

use crate::errors::{OverleafMoverError, OverleafMoverErrorKind};

/// Host of the Overleaf web UI.
const OVERLEAF_WEB_HOST: &str = "www.overleaf.com";

/// Host of the Overleaf git bridge.
const OVERLEAF_GIT_HOST: &str = "git.overleaf.com";

/// A parsed reference to one Overleaf project.
///
/// Accepted inputs are the project's web URL
/// (`https://www.overleaf.com/project/<hash>`), its git URL
/// (`https://git.overleaf.com/<hash>`), or the raw project hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    /// Canonical web URL of the project.
    pub web_url: String,

    /// Canonical git URL of the project, the clone source.
    pub git_url: String,

    /// The project hash, the last path segment of both URLs.
    pub hash: String,
}

impl SourceRef {
    /// Parse an Overleaf identifier into a canonical reference.
    ///
    /// # Errors
    /// A config error if the input is not a recognizable Overleaf
    /// project URL or hash.
    pub fn parse(input: &str) -> Result<Self, OverleafMoverError> {
        let value = input.trim().trim_end_matches('/');
        if value.is_empty() {
            return Err(OverleafMoverError::new(OverleafMoverErrorKind::Config)
                .with_text("empty source reference"));
        }
        let hash = if value.starts_with("http://") || value.starts_with("https://") {
            let url = Url::parse(value).map_err(|e| {
                OverleafMoverError::new(OverleafMoverErrorKind::Config)
                    .with_text(format!("invalid source url '{value}'"))
                    .with_source(e)
            })?;
            let path = url.path().trim_matches('/');
            match url.host_str() {
                Some(OVERLEAF_WEB_HOST) => path.strip_prefix("project/").unwrap_or(""),
                Some(OVERLEAF_GIT_HOST) => path,
                _ => {
                    return Err(OverleafMoverError::new(OverleafMoverErrorKind::Config)
                        .with_text(format!("not an Overleaf url: '{value}'")))
                }
            }
            .to_string()
        } else {
            value.to_string()
        };
        if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(OverleafMoverError::new(OverleafMoverErrorKind::Config)
                .with_text(format!("unrecognised Overleaf identifier: '{input}'")));
        }
        Ok(Self::from_hash(&hash))
    }

    /// Build the canonical URLs from a validated project hash.
    fn from_hash(hash: &str) -> Self {
        Self {
            web_url: format!("https://{OVERLEAF_WEB_HOST}/project/{hash}"),
            git_url: format!("https://{OVERLEAF_GIT_HOST}/{hash}"),
            hash: hash.to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_web_url() {
        let src = SourceRef::parse("https://www.overleaf.com/project/5f3b2a1c9d8e7f").unwrap();
        assert_eq!(src.hash, "5f3b2a1c9d8e7f");
        assert_eq!(src.git_url, "https://git.overleaf.com/5f3b2a1c9d8e7f");
    }

    #[test]
    fn parses_git_url_with_trailing_slash() {
        let src = SourceRef::parse("https://git.overleaf.com/5f3b2a1c9d8e7f/").unwrap();
        assert_eq!(src.hash, "5f3b2a1c9d8e7f");
        assert_eq!(
            src.web_url,
            "https://www.overleaf.com/project/5f3b2a1c9d8e7f"
        );
    }

    #[test]
    fn parses_raw_hash() {
        let src = SourceRef::parse("  5f3b2a1c9d8e7f ").unwrap();
        assert_eq!(src.hash, "5f3b2a1c9d8e7f");
    }

    #[test]
    fn rejects_foreign_host() {
        assert!(SourceRef::parse("https://github.com/someone/repo").is_err());
    }

    #[test]
    fn rejects_non_alphanumeric_hash() {
        assert!(SourceRef::parse("../etc/passwd").is_err());
        assert!(SourceRef::parse("").is_err());
        assert!(SourceRef::parse("https://www.overleaf.com/project/").is_err());
    }
}
