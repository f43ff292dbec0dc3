// UI layer: a numbered menu built on `dialoguer`. Each handler collects
// its fields, calls the API client behind a spinner, and prints the
// outcome. API failures are printed and the loop continues; only console
// I/O failures end the loop.

use crate::api::ApiClient;
use crate::batch::{self, UploadReport};
use crate::config::Settings;
use crate::error::ApiError;
use crate::models::{NewRepository, RepoRef, RepoUpdate, Repository};
use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

const MENU_PAUSE: Duration = Duration::from_millis(500);
const REPO_READY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    CreateRepository,
    ListMyRepositories,
    UpdateRepository,
    DeleteRepository,
    ListUserRepositories,
    UploadFiles,
    CreateAndUpload,
    DownloadFile,
    CreateFolder,
    Exit,
}

impl MenuChoice {
    /// Menu order as displayed: 1 through 9, then 0.
    pub const ALL: [MenuChoice; 10] = [
        MenuChoice::CreateRepository,
        MenuChoice::ListMyRepositories,
        MenuChoice::UpdateRepository,
        MenuChoice::DeleteRepository,
        MenuChoice::ListUserRepositories,
        MenuChoice::UploadFiles,
        MenuChoice::CreateAndUpload,
        MenuChoice::DownloadFile,
        MenuChoice::CreateFolder,
        MenuChoice::Exit,
    ];

    pub fn key(self) -> u8 {
        match self {
            MenuChoice::CreateRepository => 1,
            MenuChoice::ListMyRepositories => 2,
            MenuChoice::UpdateRepository => 3,
            MenuChoice::DeleteRepository => 4,
            MenuChoice::ListUserRepositories => 5,
            MenuChoice::UploadFiles => 6,
            MenuChoice::CreateAndUpload => 7,
            MenuChoice::DownloadFile => 8,
            MenuChoice::CreateFolder => 9,
            MenuChoice::Exit => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::CreateRepository => "Create repository",
            MenuChoice::ListMyRepositories => "List my repositories",
            MenuChoice::UpdateRepository => "Update repository",
            MenuChoice::DeleteRepository => "Delete repository",
            MenuChoice::ListUserRepositories => "List another user's repositories",
            MenuChoice::UploadFiles => "Upload files to a repository",
            MenuChoice::CreateAndUpload => "Create repository and upload project files",
            MenuChoice::DownloadFile => "Download a file",
            MenuChoice::CreateFolder => "Create a folder",
            MenuChoice::Exit => "Exit",
        }
    }

    pub fn from_key(key: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

/// Map a typed menu answer such as `"7"` to its option.
pub fn parse_menu_input(text: &str) -> Option<MenuChoice> {
    text.trim().parse::<u8>().ok().and_then(MenuChoice::from_key)
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.key(), self.label())
    }
}

/// Main interactive menu. Runs until the user picks "Exit" or the console
/// stops answering.
pub fn main_menu(api: ApiClient, settings: &Settings) -> Result<()> {
    if settings.project_dir.is_dir() {
        println!("Project directory '{}' found.", settings.project_dir.display());
    } else {
        println!(
            "{} project directory '{}' does not exist or is not accessible.",
            "Warning:".yellow(),
            settings.project_dir.display()
        );
    }

    loop {
        println!("\n=== REPOSITORY MANAGER ===");
        for choice in MenuChoice::ALL {
            println!("{choice}");
        }
        let input: Result<String, _> = Input::new().with_prompt("Choose an option").interact_text();
        let choice = match input {
            Ok(text) => match parse_menu_input(&text) {
                Some(choice) => choice,
                None => {
                    println!("Invalid option, try again.");
                    continue;
                }
            },
            Err(e) => {
                error!(error = %e, "reading menu choice failed");
                return Err(e).context("Failed to read menu choice");
            }
        };

        if choice == MenuChoice::Exit {
            println!("Exiting...");
            return Ok(());
        }

        if let Err(e) = dispatch(choice, &api, settings) {
            error!(error = %e, ?choice, "menu handler failed");
            return Err(e);
        }

        thread::sleep(MENU_PAUSE);
    }
}

fn dispatch(choice: MenuChoice, api: &ApiClient, settings: &Settings) -> Result<()> {
    info!(?choice, "menu option selected");
    match choice {
        MenuChoice::CreateRepository => handle_create(api),
        MenuChoice::ListMyRepositories => handle_list(api, None),
        MenuChoice::UpdateRepository => handle_update(api),
        MenuChoice::DeleteRepository => handle_delete(api),
        MenuChoice::ListUserRepositories => {
            let username = prompt("Username")?;
            handle_list(api, Some(username.as_str()))
        }
        MenuChoice::UploadFiles => handle_upload(api, settings),
        MenuChoice::CreateAndUpload => handle_create_and_upload(api, settings),
        MenuChoice::DownloadFile => handle_download(api),
        MenuChoice::CreateFolder => handle_create_folder(api),
        MenuChoice::Exit => Ok(()),
    }
}

fn handle_create(api: &ApiClient) -> Result<()> {
    let new_repo = prompt_new_repository()?;
    match with_spinner("Creating repository...", || api.create_repository(&new_repo)) {
        Ok(repo) => println!("Repository created: {}", repo.html_url),
        Err(e) => print_failure(&e),
    }
    Ok(())
}

fn handle_list(api: &ApiClient, username: Option<&str>) -> Result<()> {
    let repos = match with_spinner("Fetching repositories...", || api.list_repositories(username)) {
        Ok(repos) => repos,
        Err(e) => {
            print_failure(&e);
            return Ok(());
        }
    };
    if repos.is_empty() {
        println!("No repositories found.");
        return Ok(());
    }

    match username {
        Some(user) => println!("\n=== REPOSITORIES OF {} ===", user.to_uppercase()),
        None => println!("\n=== YOUR REPOSITORIES ==="),
    }
    for (i, repo) in repos.iter().enumerate() {
        println!("{}", format_repository(i + 1, repo, username.is_some()));
    }
    Ok(())
}

fn handle_update(api: &ApiClient) -> Result<()> {
    let repo = prompt_repo_ref()?;
    println!("\nLeave a field blank to keep its current value:");
    let new_name = prompt_optional("New name")?;
    let description = prompt_optional("New description")?;
    let visibility = Select::new()
        .with_prompt("Visibility")
        .items(&Visibility::LABELS)
        .default(0)
        .interact()?;

    let update = build_update(new_name, description, Visibility::from_index(visibility));
    match with_spinner("Updating repository...", || api.update_repository(&repo, &update)) {
        Ok(updated) => println!("Repository updated: {}", updated.html_url),
        Err(e) => print_failure(&e),
    }
    Ok(())
}

fn handle_delete(api: &ApiClient) -> Result<()> {
    println!("\n{} this operation cannot be undone", "WARNING:".red().bold());
    let repo = prompt_repo_ref()?;

    match with_spinner("Looking up repository...", || api.get_repository(&repo)) {
        Ok(info) => println!("{}", format_repository(1, &info, false)),
        Err(e) => {
            print_failure(&e);
            return Ok(());
        }
    }

    let confirmation = prompt(&format!("To confirm, type exactly {repo}"))?;
    if confirmation != repo.to_string() {
        println!("Confirmation did not match. Operation cancelled.");
        return Ok(());
    }

    match with_spinner(&format!("Deleting {repo}..."), || api.delete_repository(&repo)) {
        Ok(()) => println!("Repository deleted."),
        Err(e) => print_failure(&e),
    }
    Ok(())
}

fn handle_upload(api: &ApiClient, settings: &Settings) -> Result<()> {
    let repo = prompt_repo_ref()?;
    let use_project = Confirm::new()
        .with_prompt(format!(
            "Use project directory '{}'?",
            settings.project_dir.display()
        ))
        .default(true)
        .interact()?;
    let dir = if use_project {
        settings.project_dir.clone()
    } else {
        PathBuf::from(prompt("Local directory with the files to upload")?)
    };

    println!("Uploading files from '{}' to {repo}...", dir.display());
    upload_and_report(api, &repo, &dir, settings.upload_delay);
    Ok(())
}

fn handle_create_and_upload(api: &ApiClient, settings: &Settings) -> Result<()> {
    let new_repo = prompt_new_repository()?;
    if !settings.project_dir.is_dir() {
        println!(
            "{} project directory '{}' does not exist.",
            "Error:".red().bold(),
            settings.project_dir.display()
        );
        return Ok(());
    }

    let created = match with_spinner("Creating repository...", || api.create_repository(&new_repo)) {
        Ok(repo) => repo,
        Err(e) => {
            print_failure(&e);
            return Ok(());
        }
    };
    println!("Repository created: {}", created.html_url);

    with_spinner("Waiting for the repository to be ready...", || {
        thread::sleep(REPO_READY_DELAY)
    });

    if created.owner.login.is_empty() {
        println!("Could not determine the repository owner.");
        return Ok(());
    }
    let repo = RepoRef::new(created.owner.login, created.name);
    println!(
        "Uploading files from '{}' to the new repository...",
        settings.project_dir.display()
    );
    upload_and_report(api, &repo, &settings.project_dir, settings.upload_delay);
    Ok(())
}

fn handle_download(api: &ApiClient) -> Result<()> {
    let repo = prompt_repo_ref()?;
    let remote_path = prompt("Path of the file in the repository")?;
    let local_path = prompt_optional("Local path to save to (blank = same name)")?.map(PathBuf::from);

    let result = with_spinner(&format!("Downloading {remote_path} from {repo}..."), || {
        api.download_file(&repo, &remote_path, local_path.as_deref())
    });
    match result {
        Ok(path) => println!("File saved to {}", path.display()),
        Err(e) => print_failure(&e),
    }
    Ok(())
}

fn handle_create_folder(api: &ApiClient) -> Result<()> {
    let repo = prompt_repo_ref()?;
    let folder = prompt("Folder path to create")?.trim_matches('/').to_string();
    if folder.is_empty() {
        println!("{} the folder path cannot be empty.", "Error:".red().bold());
        return Ok(());
    }

    match with_spinner(&format!("Creating folder '{folder}' in {repo}..."), || {
        api.create_folder(&repo, &folder, None)
    }) {
        Ok(_) => println!("Folder created: {folder}"),
        Err(e) => print_failure(&e),
    }
    Ok(())
}

fn upload_and_report(api: &ApiClient, repo: &RepoRef, dir: &Path, delay: Duration) {
    let spinner = new_spinner("Reading directory...");
    let result = batch::upload_directory(api, repo, dir, delay, |name| {
        spinner.set_message(format!("Uploading {name}..."));
    });
    spinner.finish_and_clear();

    match result {
        Ok(report) => print_report(&report),
        Err(e) => print_failure(&e),
    }
}

fn print_report(report: &UploadReport) {
    for name in &report.skipped {
        println!("Skipped directory: {name}");
    }
    for name in &report.uploaded {
        println!("Uploaded {name}");
    }
    if report.is_clean() {
        println!("Done. All {} files uploaded.", report.uploaded.len());
        return;
    }
    for (name, err) in &report.failed {
        println!("{} {name}: {err}", "Failed".red());
        if let Some(details) = err.details() {
            println!("   Details: {details}");
        }
    }
    println!(
        "Done. Files uploaded: {}, errors: {}",
        report.uploaded.len(),
        report.failed.len()
    );
}

/// Print an API failure as an error line plus the service's message.
fn print_failure(err: &ApiError) {
    println!("{} {err}", "Error:".red().bold());
    if let Some(details) = err.details() {
        println!("Details: {details}");
    }
}

/// One numbered entry of a repository listing.
pub fn format_repository(index: usize, repo: &Repository, show_language: bool) -> String {
    let visibility = if repo.private { "Private" } else { "Public" };
    let mut out = format!("{index}. {} [{visibility}]\n", repo.name);
    if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("   Description: {description}\n"));
    }
    out.push_str(&format!("   URL: {}\n", repo.html_url));
    if show_language {
        let language = repo.language.as_deref().unwrap_or("not specified");
        out.push_str(&format!("   Primary language: {language}\n"));
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Keep,
    Private,
    Public,
}

impl Visibility {
    const LABELS: [&'static str; 3] = ["Keep current", "Private", "Public"];

    fn from_index(index: usize) -> Self {
        match index {
            1 => Visibility::Private,
            2 => Visibility::Public,
            _ => Visibility::Keep,
        }
    }
}

/// Turn the update prompts into a request; blank answers are left out.
pub fn build_update(
    new_name: Option<String>,
    description: Option<String>,
    visibility: Visibility,
) -> RepoUpdate {
    RepoUpdate {
        name: new_name,
        description,
        private: match visibility {
            Visibility::Keep => None,
            Visibility::Private => Some(true),
            Visibility::Public => Some(false),
        },
    }
}

fn prompt_new_repository() -> Result<NewRepository> {
    let name = prompt("Repository name")?;
    let description = prompt_optional("Description (optional)")?;
    let private = Confirm::new()
        .with_prompt("Private repository?")
        .default(false)
        .interact()?;
    let auto_init = Confirm::new()
        .with_prompt("Initialize with a README?")
        .default(true)
        .interact()?;
    Ok(NewRepository {
        name,
        private,
        auto_init,
        description,
    })
}

fn prompt_repo_ref() -> Result<RepoRef> {
    let owner = prompt("Repository owner")?;
    let name = prompt("Repository name")?;
    Ok(RepoRef::new(owner, name))
}

fn prompt(label: &str) -> Result<String> {
    let value: String = Input::new().with_prompt(label).interact_text()?;
    Ok(value.trim().to_string())
}

fn prompt_optional(label: &str) -> Result<Option<String>> {
    let value: String = Input::new()
        .with_prompt(label)
        .allow_empty(true)
        .interact_text()?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn new_spinner(msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Run `f` while a spinner shows `msg`; the spinner is cleared before
/// anything is printed.
fn with_spinner<T>(msg: &str, f: impl FnOnce() -> T) -> T {
    let spinner = new_spinner(msg);
    let out = f();
    spinner.finish_and_clear();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Owner;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn repo(language: Option<&str>) -> Repository {
        Repository {
            name: "demo".into(),
            full_name: "octo/demo".into(),
            html_url: "https://github.com/octo/demo".into(),
            description: Some("Blink an LED".into()),
            private: true,
            language: language.map(str::to_string),
            owner: Owner {
                login: "octo".into(),
            },
        }
    }

    #[test]
    fn menu_keys_cover_zero_to_nine_once() {
        let keys: HashSet<u8> = MenuChoice::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(keys, (0..=9).collect::<HashSet<u8>>());
        for choice in MenuChoice::ALL {
            assert_eq!(MenuChoice::from_key(choice.key()), Some(choice));
        }
        assert_eq!(MenuChoice::from_key(10), None);
    }

    #[test]
    fn menu_items_are_numbered() {
        assert_eq!(MenuChoice::CreateRepository.to_string(), "1. Create repository");
        assert_eq!(MenuChoice::Exit.to_string(), "0. Exit");
        assert_eq!(MenuChoice::ALL[9], MenuChoice::Exit);
    }

    #[test]
    fn typed_digits_select_menu_options() {
        assert_eq!(parse_menu_input("7"), Some(MenuChoice::CreateAndUpload));
        assert_eq!(parse_menu_input(" 0 \n"), Some(MenuChoice::Exit));
        assert_eq!(parse_menu_input("1"), Some(MenuChoice::CreateRepository));
        assert_eq!(parse_menu_input("10"), None);
        assert_eq!(parse_menu_input("x"), None);
        assert_eq!(parse_menu_input("-1"), None);
    }

    #[test]
    fn blank_update_prompts_produce_empty_update() {
        let update = build_update(None, None, Visibility::from_index(0));
        assert!(update.is_empty());

        let update = build_update(Some("renamed".into()), None, Visibility::from_index(2));
        assert_eq!(update.name.as_deref(), Some("renamed"));
        assert_eq!(update.private, Some(false));
        assert_eq!(update.description, None);
    }

    #[test]
    fn listing_shows_language_only_for_other_users() {
        let own = format_repository(1, &repo(None), false);
        assert_eq!(
            own,
            "1. demo [Private]\n   Description: Blink an LED\n   URL: https://github.com/octo/demo\n"
        );

        let other = format_repository(2, &repo(None), true);
        assert!(other.ends_with("   Primary language: not specified\n"));
        let other = format_repository(2, &repo(Some("Python")), true);
        assert!(other.contains("Primary language: Python"));
    }
}
