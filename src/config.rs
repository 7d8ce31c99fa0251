//! Run configuration, resolved once before any stage executes.
use std::env;
use std::path::PathBuf;

use crate::cli::OverleafMoverCli;
use crate::errors::{OverleafMoverError, OverleafMoverErrorKind};

/// Environment variable carrying the GitLab access token.
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

/// Everything a run needs, resolved up front.
///
/// The token is read from [`TOKEN_ENV`] or prompted without echo; it is
/// never logged or persisted.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// GitLab access token.
    pub token: String,

    /// Directory the project is cloned into.
    pub dir: PathBuf,
}

impl RunConfig {
    /// Resolve the run configuration from CLI options and environment.
    ///
    /// # Errors
    /// A config error when the target directory does not exist or no
    /// token can be obtained.
    pub fn resolve(cli: &OverleafMoverCli) -> Result<Self, OverleafMoverError> {
        let dir = cli.dir.clone();
        if !dir.is_dir() {
            return Err(OverleafMoverError::new(OverleafMoverErrorKind::Config)
                .with_text(format!("'{}' is not a directory", dir.display())));
        }
        let token = match env::var(TOKEN_ENV).ok().and_then(|t| normalize_token(&t)) {
            Some(token) => token,
            None => prompt_token()?,
        };
        Ok(Self { token, dir })
    }
}

/// Trim a raw token, rejecting empty input.
fn normalize_token(raw: &str) -> Option<String> {
    let token = raw.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Prompt for the token on stdin without echoing it.
///
/// # Errors
/// A config error when reading fails or the input is empty.
fn prompt_token() -> Result<String, OverleafMoverError> {
    let raw = rpassword::prompt_password(
        "Enter your gitlab token (https://gitlab.com/-/user_settings/personal_access_tokens): ",
    )
    .map_err(|e| {
        OverleafMoverError::new(OverleafMoverErrorKind::Config)
            .with_text("error reading token")
            .with_source(e)
    })?;
    normalize_token(&raw).ok_or_else(|| {
        OverleafMoverError::new(OverleafMoverErrorKind::Config).with_text("no access token provided")
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::OverleafMoverErrorKind;

    #[test]
    fn normalize_token_trims_and_rejects_empty() {
        assert_eq!(normalize_token("  glpat-abc  "), Some("glpat-abc".to_string()));
        assert_eq!(normalize_token(""), None);
        assert_eq!(normalize_token("   \n"), None);
    }

    #[test]
    fn missing_directory_is_a_config_error() {
        let cli = OverleafMoverCli {
            source: "5f3b2a1c9d8e7f".to_string(),
            dir: PathBuf::from("/definitely/not/a/real/directory"),
            verbose: 0,
        };
        let err = RunConfig::resolve(&cli).unwrap_err();
        assert_eq!(err.kind(), OverleafMoverErrorKind::Config);
    }
}
