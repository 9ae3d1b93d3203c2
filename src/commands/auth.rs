//! Session commands: `login`, `logout`, `whoami`

use jiff::Timestamp;
use owo_colors::OwoColorize;
use serde_json::json;

use super::print_json;
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{DeskError, Result};
use crate::session::SessionStore;
use crate::utils::read_line;

/// Sign in and store the session
pub async fn cmd_login(username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_line("Password: ")?,
    };
    if username.trim().is_empty() || password.is_empty() {
        return Err(DeskError::Other(
            "username and password are required".to_string(),
        ));
    }

    let config = Config::load()?;
    let client = ApiClient::from_config(&config, None)?;
    let response = client.login(username.trim(), &password).await?;
    let session = response.into_session()?;

    let store = SessionStore::open()?;
    let session = store.sign_in(session)?;

    println!(
        "Signed in as {} (session valid until {})",
        session.user_name().cyan(),
        session.expiration()
    );
    Ok(())
}

/// Remove the stored session
pub fn cmd_logout() -> Result<()> {
    let store = SessionStore::open()?;
    let was_signed_in = store.current().is_some();
    store.invalidate()?;
    if was_signed_in {
        println!("Signed out");
    } else {
        println!("{}", "No session to sign out of".dimmed());
    }
    Ok(())
}

/// Show who is signed in
pub fn cmd_whoami(json: bool) -> Result<()> {
    let store = SessionStore::open()?;
    let session = store.current().ok_or(DeskError::NotSignedIn)?;
    let valid = session.is_valid_at(Timestamp::now());

    if json {
        return print_json(&json!({
            "user_name": session.user_name(),
            "is_superuser": session.is_superuser(),
            "expiration": session.expiration().to_string(),
            "valid": valid,
            "has_refresh_token": session.has_refresh_token(),
        }));
    }

    let role = if session.is_superuser() {
        "superuser".yellow().to_string()
    } else {
        "user".to_string()
    };
    println!("{} ({})", session.user_name().cyan().bold(), role);
    if valid {
        println!("expires {}", session.expiration());
    } else {
        println!("{} {}", "expired".red(), session.expiration());
    }
    Ok(())
}
