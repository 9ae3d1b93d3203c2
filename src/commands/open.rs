//! Interactive console command (`deltadesk open`)

use std::sync::Arc;

use jiff::Timestamp;
use tracing::info;

use crate::desk::Desk;
use crate::error::{DeskError, Result};
use crate::router::{Location, Route, guard};
use crate::session::SessionStore;
use crate::tui::{Exit, run_location};

/// Open `location` in the console and follow navigation between screens
/// until the user quits
pub async fn cmd_open(location: &str) -> Result<()> {
    let requested = Location::parse(location)?;
    let sessions = SessionStore::open()?;
    let now = Timestamp::now();

    let route = guard(requested.route, sessions.current().as_deref(), now);
    if route == Route::Login {
        if requested.route.is_protected() {
            info!(location = %requested, "redirecting to sign-in");
            sessions.require_valid(now)?;
        }
        println!("Sign in with: deltadesk login --username <name>");
        return Ok(());
    }

    let mut location = if route == requested.route {
        requested
    } else {
        Location::new(route)
    };

    let desk = Arc::new(Desk::connect()?);
    loop {
        match run_location(desk.clone(), location).await? {
            Exit::Quit => return Ok(()),
            Exit::Navigate(next) => {
                let session = desk.sessions.current();
                if guard(next.route, session.as_deref(), Timestamp::now()) == Route::Login {
                    return Err(DeskError::NotSignedIn);
                }
                info!(location = %next, "navigating");
                location = next;
            }
        }
    }
}
