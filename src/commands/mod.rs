mod auth;
mod config;
mod groups;
mod open;
mod permissions;
mod users;

pub use auth::{cmd_login, cmd_logout, cmd_whoami};
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use groups::{cmd_group_create, cmd_group_delete, cmd_group_show, cmd_group_update, cmd_groups_ls};
pub use open::cmd_open;
pub use permissions::{cmd_permission_create, cmd_permission_delete, cmd_permissions_ls};
pub use users::{
    UserListOptions, cmd_user_assign, cmd_user_create, cmd_user_delete, cmd_user_permissions,
    cmd_user_update, cmd_users_ls,
};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::Table;
use tabled::Tabled;
use tabled::settings::Style;

use crate::desk::Desk;
use crate::error::Result;
use crate::forms::Mutation;
use crate::notify::ConsoleNotifier;

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print rows as a table, or a dimmed placeholder when there are none
pub fn print_table<R: Tabled>(rows: Vec<R>, empty: &str) {
    if rows.is_empty() {
        println!("{}", empty.dimmed());
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

/// Yes/no cell for boolean columns
pub fn format_flag(value: bool) -> String {
    if value {
        "yes".green().to_string()
    } else {
        "no".dimmed().to_string()
    }
}

pub fn format_optional(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// Await a mutation and report it on the console
pub(crate) async fn run_mutation(
    desk: &Desk,
    mutation: Mutation,
    request: impl Future<Output = Result<()>>,
) -> Result<()> {
    desk.finish(mutation, request.await, &ConsoleNotifier)
        .map_err(|failure| failure.into_error())
}
