// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) wires these modules together into the interactive menu.
//
// Module responsibilities:
// - `api`: HTTP interactions with the hosting service (repositories,
//   file contents, folders).
// - `batch`: bulk upload of a local directory on top of `api`.
// - `config`: settings from the environment and token persistence.
// - `error` / `models`: the result type and the JSON payload shapes.
// - `ui`: terminal menu flows that delegate requests to `api`.
pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod ui;

pub use api::ApiClient;
pub use config::{ClientConfig, Settings};
pub use error::{ApiError, ApiResult, ErrorDetails};
pub use models::RepoRef;
