//! GitLab API client for repository provisioning.
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::errors::{OverleafMoverError, OverleafMoverErrorKind};

/// Host of the destination platform.
pub(crate) const GITLAB_URL: &str = "gitlab.com";

/// Authenticated client against one GitLab instance.
pub struct GitlabClient {
    /// Host the API calls go to.
    host: String,

    /// Personal access token, sent as the `PRIVATE-TOKEN` header.
    token: String,

    /// Shared HTTP client.
    client: reqwest::Client,
}

impl GitlabClient {
    /// Create a client against gitlab.com.
    pub fn new(token: String) -> Self {
        Self::with_host(GITLAB_URL.to_string(), token)
    }

    /// Create a client against a specific host.
    pub fn with_host(host: String, token: String) -> Self {
        Self {
            host,
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Build a v4 API endpoint URL.
    fn api(&self, path: &str) -> String {
        format!("https://{}/api/v4/{}", self.host, path)
    }

    /// Fetch the user the token authenticates as.
    ///
    /// Doubles as the authentication check before any repository is
    /// created.
    ///
    /// # Errors
    /// A provision error when the token is rejected.
    pub async fn current_user(&self) -> Result<GitlabUser, OverleafMoverError> {
        let response = self
            .client
            .get(self.api("user"))
            .header("PRIVATE-TOKEN", &self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OverleafMoverError::new(OverleafMoverErrorKind::Provision)
                .with_text(format!("authentication rejected: {text}")));
        }
        let user = response.json::<GitlabUser>().await?;
        Ok(user)
    }

    /// Look up a project by its full path (`namespace/path`).
    ///
    /// # Errors
    /// A provision error on any response other than success or 404.
    pub async fn get_project(
        &self,
        path_with_namespace: &str,
    ) -> Result<Option<GitlabProject>, OverleafMoverError> {
        let encoded = urlencoding::encode(path_with_namespace);
        let response = self
            .client
            .get(self.api(&format!("projects/{encoded}")))
            .header("PRIVATE-TOKEN", &self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OverleafMoverError::new(OverleafMoverErrorKind::Provision)
                .with_text(format!("project lookup failed: {text}")));
        }
        let project = response.json::<GitlabProject>().await?;
        Ok(Some(project))
    }

    /// Create a new private project.
    ///
    /// Name collisions are not retried or suffixed; GitLab's rejection
    /// is surfaced as-is.
    ///
    /// # Errors
    /// A provision error when the platform rejects the creation.
    pub async fn create_project(
        &self,
        name: &str,
        path: &str,
    ) -> Result<GitlabProject, OverleafMoverError> {
        let json_body = CreateProjectRequest {
            name: name.to_string(),
            path: path.to_string(),
            visibility: "private".to_string(),
        };
        let response = self
            .client
            .post(self.api("projects"))
            .header("PRIVATE-TOKEN", &self.token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&json_body)
            .send()
            .await?;
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OverleafMoverError::new(OverleafMoverErrorKind::Provision)
                .with_text(format!("creating project '{path}' failed: {text}")));
        }
        let project = response.json::<GitlabProject>().await?;
        Ok(project)
    }
}

/// Project-creation request body.
#[derive(Serialize, Debug, Clone)]
struct CreateProjectRequest {
    /// Human-readable project name.
    name: String,

    /// URL-safe project path.
    path: String,

    /// Visibility level; always `private` for fresh migrations.
    visibility: String,
}

/// The subset of GitLab's project representation this tool uses.
#[derive(Deserialize, Debug, Clone)]
pub struct GitlabProject {
    /// Numeric project id.
    pub id: u64,

    /// Project display name.
    pub name: String,

    /// Project path.
    pub path: String,

    /// Full `namespace/path`.
    pub path_with_namespace: String,

    /// Web UI URL.
    pub web_url: String,

    /// SSH clone/push URL.
    pub ssh_url_to_repo: String,

    /// HTTPS clone/push URL.
    pub http_url_to_repo: String,
}

/// The authenticated user.
#[derive(Deserialize, Debug, Clone)]
pub struct GitlabUser {
    /// Numeric user id.
    pub id: u64,

    /// Username, also the namespace of personal projects.
    pub username: String,
}
