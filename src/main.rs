// Entrypoint for the CLI application.
// - Keeps `main` small: load settings, make sure a token is available,
//   create an API client and hand it to the UI loop.
// - Logs go to stderr and are silent unless `RUST_LOG` is set.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Password};
use repo_manager::config::{persist_token, token_path};
use repo_manager::{ui::main_menu, ApiClient, Settings};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env().context("Failed to load settings")?;
    tracing::debug!(?settings, "settings loaded");

    let token = match settings.token.clone() {
        Some(token) => token,
        None => ask_for_token()?,
    };

    let api = ApiClient::new(settings.client_config(token))?;

    // Blocks until the user exits or the console fails.
    let outcome = main_menu(api, &settings);
    println!("Program finished.");
    outcome
}

/// Prompt for a personal access token and optionally store it for the
/// next run.
fn ask_for_token() -> Result<String> {
    println!("No token found in GITHUB_TOKEN or {}.", token_path().display());
    let token: String = Password::new().with_prompt("Access token").interact()?;
    let token = token.trim().to_string();

    let save = Confirm::new()
        .with_prompt("Save token for future runs?")
        .default(false)
        .interact()?;
    if save {
        persist_token(&token_path(), &token)?;
    }
    Ok(token)
}
