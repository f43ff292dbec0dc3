// API client module: a small blocking HTTP client that talks to the
// hosting service's REST API. Every operation is one synchronous round
// trip and always comes back as an `ApiResult`, never a panic.

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, ErrorDetails};
use crate::models::{
    ContentEntry, ContentKind, ContentUpdate, Contents, NewRepository, PutContents, RepoRef,
    RepoUpdate, Repository,
};
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

const ACCEPT_V3: &str = "application/vnd.github.v3+json";

/// Marker file committed to make an otherwise empty directory exist.
pub const PLACEHOLDER_FILE: &str = ".keep";

/// Client holding a reqwest blocking client with the fixed header set
/// (token, content type, API version, user agent) already applied.
///
/// A second client without the token fetches direct-content URLs that
/// point outside the API host.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    raw_client: Client,
    base_url: Url,
    branch: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client from `config`. Fails if the API URL cannot be parsed,
    /// the token cannot be used as a header value, or the HTTP client
    /// cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid API URL: {}", config.api_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API URL cannot carry a path: {}", config.api_url);
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .context("Token contains characters not allowed in an HTTP header")?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;
        let raw_client = Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(ApiClient {
            client,
            raw_client,
            base_url,
            branch: config.branch,
        })
    }

    /// API URL with `segments` appended, each one percent-encoded so that
    /// characters like `#`, `?` or `%` stay part of the path.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects URLs that cannot be a base, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn repo_url(&self, repo: &RepoRef) -> Url {
        self.endpoint(["repos", repo.owner.as_str(), repo.name.as_str()])
    }

    fn contents_url(&self, repo: &RepoRef, path: &str) -> Url {
        self.endpoint(
            ["repos", repo.owner.as_str(), repo.name.as_str(), "contents"]
                .into_iter()
                .chain(path.split('/').filter(|s| !s.is_empty())),
        )
    }

    /// Create a repository owned by the authenticated user.
    pub fn create_repository(&self, repo: &NewRepository) -> ApiResult<Repository> {
        let url = self.endpoint(["user", "repos"]);
        debug!(%url, name = %repo.name, "creating repository");
        let res = self.client.post(url).json(repo).send()?;
        parse_response("create repository", res, &[StatusCode::OK, StatusCode::CREATED])
    }

    /// List repositories of the authenticated user, or of `username`.
    pub fn list_repositories(&self, username: Option<&str>) -> ApiResult<Vec<Repository>> {
        let url = match username {
            Some(user) => self.endpoint(["users", user, "repos"]),
            None => self.endpoint(["user", "repos"]),
        };
        debug!(%url, "listing repositories");
        let res = self.client.get(url).send()?;
        parse_response("list repositories", res, &[StatusCode::OK])
    }

    /// Metadata of a single repository.
    pub fn get_repository(&self, repo: &RepoRef) -> ApiResult<Repository> {
        let url = self.repo_url(repo);
        debug!(%url, "fetching repository");
        let res = self.client.get(url).send()?;
        parse_response("get repository", res, &[StatusCode::OK])
    }

    /// Send only the fields set in `update`. An empty update is rejected
    /// before anything goes over the wire.
    pub fn update_repository(&self, repo: &RepoRef, update: &RepoUpdate) -> ApiResult<Repository> {
        if update.is_empty() {
            return Err(ApiError::NoChanges);
        }
        let url = self.repo_url(repo);
        debug!(%url, "updating repository");
        let res = self.client.patch(url).json(update).send()?;
        parse_response("update repository", res, &[StatusCode::OK])
    }

    /// Delete a repository. Only `204 No Content` counts as success.
    pub fn delete_repository(&self, repo: &RepoRef) -> ApiResult<()> {
        let url = self.repo_url(repo);
        debug!(%url, "deleting repository");
        let res = self
            .client
            .delete(url)
            .header(CONTENT_LENGTH, 0)
            .send()?;
        if res.status() == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(status_error("delete repository", res))
        }
    }

    /// Revision identifier (sha) of the file at `path`, or `None` if the
    /// file does not exist, is a directory, or cannot be looked up.
    pub fn file_revision(&self, repo: &RepoRef, path: &str) -> Option<String> {
        let url = self.contents_url(repo, path);
        let res = match self.client.get(url.clone()).send() {
            Ok(res) => res,
            Err(e) => {
                debug!(%url, error = %e, "revision lookup failed");
                return None;
            }
        };
        if !res.status().is_success() {
            debug!(%url, status = %res.status(), "no existing revision");
            return None;
        }
        match serde_json::from_str::<Contents>(&res.text().ok()?) {
            Ok(Contents::Entry(entry)) => Some(entry.sha),
            _ => None,
        }
    }

    /// Upload `local_file` to `remote_path` (defaults to the file name).
    /// Overwrites an existing file by sending its current revision.
    pub fn upload_file(
        &self,
        repo: &RepoRef,
        local_file: &Path,
        remote_path: Option<&str>,
        message: Option<&str>,
    ) -> ApiResult<ContentUpdate> {
        let remote_path = match remote_path {
            Some(path) => path.trim_start_matches('/').to_string(),
            None => file_name(local_file),
        };
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Upload {remote_path} from repo-manager"));

        let bytes = std::fs::read(local_file).map_err(|e| ApiError::io(local_file, e))?;
        let sha = self.file_revision(repo, &remote_path);
        debug!(path = %remote_path, overwrite = sha.is_some(), bytes = bytes.len(), "uploading file");

        let body = PutContents {
            message,
            content: STANDARD.encode(bytes),
            branch: self.branch.clone(),
            sha,
        };
        self.put_contents("upload file", repo, &remote_path, &body)
    }

    /// Download the file at `remote_path` into `local_file` (defaults to
    /// the last path segment). Returns the path written.
    ///
    /// The token is only sent along when the direct-content URL lives on
    /// the API host itself.
    pub fn download_file(
        &self,
        repo: &RepoRef,
        remote_path: &str,
        local_file: Option<&Path>,
    ) -> ApiResult<PathBuf> {
        let remote_path = remote_path.trim_start_matches('/');
        let local_file = match local_file {
            Some(path) => path.to_path_buf(),
            None => default_local_path(remote_path),
        };

        let url = self.contents_url(repo, remote_path);
        debug!(%url, "fetching file metadata");
        let res = self.client.get(url).send()?;
        let contents: Contents = parse_response("get file metadata", res, &[StatusCode::OK])?;

        let entry: ContentEntry = match contents {
            Contents::Entry(entry) if entry.kind == ContentKind::File => entry,
            _ => return Err(ApiError::NotAFile(remote_path.to_string())),
        };
        let download_url = entry
            .download_url
            .ok_or_else(|| ApiError::MissingDownloadUrl(remote_path.to_string()))?;
        let download_url =
            Url::parse(&download_url).map_err(|_| ApiError::BadDownloadUrl(download_url))?;

        let same_origin = download_url.origin() == self.base_url.origin();
        debug!(url = %download_url, same_origin, "downloading file content");
        let client = if same_origin { &self.client } else { &self.raw_client };
        let res = client.get(download_url).send()?;
        if !res.status().is_success() {
            return Err(ApiError::Download {
                status: res.status().as_u16(),
            });
        }
        let bytes = res.bytes()?;
        std::fs::write(&local_file, &bytes).map_err(|e| ApiError::io(&local_file, e))?;
        Ok(local_file)
    }

    /// Create `folder_path` by committing an empty placeholder file in it.
    pub fn create_folder(
        &self,
        repo: &RepoRef,
        folder_path: &str,
        message: Option<&str>,
    ) -> ApiResult<ContentUpdate> {
        let folder = folder_path.trim_matches('/');
        let path = if folder.is_empty() {
            PLACEHOLDER_FILE.to_string()
        } else {
            format!("{folder}/{PLACEHOLDER_FILE}")
        };
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Create folder {folder} from repo-manager"));

        let body = PutContents {
            message,
            content: STANDARD.encode(b""),
            branch: self.branch.clone(),
            sha: None,
        };
        self.put_contents("create folder", repo, &path, &body)
    }

    fn put_contents(
        &self,
        action: &'static str,
        repo: &RepoRef,
        path: &str,
        body: &PutContents,
    ) -> ApiResult<ContentUpdate> {
        let url = self.contents_url(repo, path);
        let res = self.client.put(url).json(body).send()?;
        parse_response(action, res, &[StatusCode::OK, StatusCode::CREATED])
    }
}

/// Last segment of a remote path, used when no local path is given.
fn default_local_path(remote_path: &str) -> PathBuf {
    PathBuf::from(remote_path.rsplit('/').next().unwrap_or(remote_path))
}

/// Parse the body as `T` when the status is one of `ok`, otherwise turn
/// the response into a status error.
fn parse_response<T: DeserializeOwned>(
    action: &'static str,
    res: Response,
    ok: &[StatusCode],
) -> ApiResult<T> {
    let status = res.status();
    debug!(action, %status, "response received");
    if !ok.contains(&status) {
        return Err(status_error(action, res));
    }
    let body = res.text()?;
    Ok(serde_json::from_str(&body)?)
}

fn status_error(action: &'static str, res: Response) -> ApiError {
    let status = res.status().as_u16();
    let body = res.text().unwrap_or_default();
    ApiError::Status {
        action,
        status,
        details: ErrorDetails::from_body(&body),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
