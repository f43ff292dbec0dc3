// Request and response shapes for the hosting API. Only the fields the
// client actually reads or sends are modelled; serde ignores the rest.

use serde::{Deserialize, Serialize};
use std::fmt;

/// (owner, name) pair identifying a remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        RepoRef {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Body of `POST /user/repos`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct NewRepository {
    pub name: String,
    pub private: bool,
    pub auto_init: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRepository {
    /// Public repository initialised with a README.
    pub fn new(name: impl Into<String>) -> Self {
        NewRepository {
            name: name.into(),
            private: false,
            auto_init: true,
            description: None,
        }
    }
}

/// Body of `PATCH /repos/{owner}/{repo}`. Unset fields are left out of the
/// request so the service keeps their current values.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct RepoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
}

impl RepoUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.private.is_none()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Owner {
    pub login: String,
}

/// Repository metadata as returned by create, list, get and update.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub language: Option<String>,
    pub owner: Owner,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One entry of the contents API.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// `GET /contents/{path}` answers with a single entry for files and with a
/// listing when the path is a directory.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Contents {
    Entry(ContentEntry),
    Listing(Vec<ContentEntry>),
}

/// Body of `PUT /contents/{path}`. `sha` must be present to overwrite an
/// existing file and absent to create a new one.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PutContents {
    pub message: String,
    pub content: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Commit {
    pub sha: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of a create-or-update content request.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ContentUpdate {
    pub content: Option<ContentEntry>,
    pub commit: Commit,
}
