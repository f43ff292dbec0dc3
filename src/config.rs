// Configuration module: everything the client needs is collected once at
// startup into plain structs and handed to the API client and the UI.
// Nothing here is global; `main` owns the values.

use anyhow::{Context, Result};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_PROJECT_DIR: &str = "project";
pub const DEFAULT_UPLOAD_DELAY: Duration = Duration::from_millis(1000);
pub const USER_AGENT: &str = concat!("repo-manager/", env!("CARGO_PKG_VERSION"));

const TOKEN_FILE: &str = ".repo_manager_token";

/// Settings used to build an `ApiClient`. The token is fixed for the
/// lifetime of the client.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub token: String,
    pub branch: String,
    pub user_agent: String,
}

impl ClientConfig {
    /// Config pointing at the public API with the default branch.
    pub fn new(token: impl Into<String>) -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.into(),
            token: token.into(),
            branch: DEFAULT_BRANCH.into(),
            user_agent: USER_AGENT.into(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

// Hand-written so the token never ends up in logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("branch", &self.branch)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Application settings read from the environment.
///
/// | variable                       | default                  |
/// |--------------------------------|--------------------------|
/// | `GITHUB_API_URL`               | `https://api.github.com` |
/// | `GITHUB_TOKEN`                 | token file, then prompt  |
/// | `REPO_MANAGER_BRANCH`          | `main`                   |
/// | `REPO_MANAGER_PROJECT_DIR`     | `project`                |
/// | `REPO_MANAGER_UPLOAD_DELAY_MS` | `1000`                   |
#[derive(Clone)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub branch: String,
    pub project_dir: PathBuf,
    pub upload_delay: Duration,
}

impl Settings {
    /// Read settings from the process environment, falling back to the
    /// token file in the user's home directory for the token.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), &token_path())
    }

    /// Same as `from_env` but with an injectable variable lookup and
    /// token file location.
    pub fn from_lookup<F>(lookup: F, token_file: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = match non_empty("GITHUB_TOKEN") {
            Some(t) => Some(t.trim().to_string()),
            None => load_token(token_file)?,
        };

        let upload_delay = match non_empty("REPO_MANAGER_UPLOAD_DELAY_MS") {
            Some(raw) => {
                let ms: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("REPO_MANAGER_UPLOAD_DELAY_MS is not a number: {raw}"))?;
                Duration::from_millis(ms)
            }
            None => DEFAULT_UPLOAD_DELAY,
        };

        Ok(Settings {
            api_url: non_empty("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            token,
            branch: non_empty("REPO_MANAGER_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.into()),
            project_dir: non_empty("REPO_MANAGER_PROJECT_DIR")
                .unwrap_or_else(|| DEFAULT_PROJECT_DIR.into())
                .into(),
            upload_delay,
        })
    }

    /// Build the client configuration once a token is known.
    pub fn client_config(&self, token: impl Into<String>) -> ClientConfig {
        ClientConfig::new(token)
            .with_api_url(self.api_url.clone())
            .with_branch(self.branch.clone())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("branch", &self.branch)
            .field("project_dir", &self.project_dir)
            .field("upload_delay", &self.upload_delay)
            .finish()
    }
}

/// Location of the persisted token in the user's home directory.
pub fn token_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(TOKEN_FILE)
}

/// Load a token from `path`. A missing or blank file is not an error.
pub fn load_token(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(data) => {
            let token = data.trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read token file {}", path.display())),
    }
}

/// Persist a token so the next run does not have to ask for it.
pub fn persist_token(path: &Path, token: &str) -> Result<()> {
    std::fs::write(path, token)
        .with_context(|| format!("Failed to write token file {}", path.display()))
}
