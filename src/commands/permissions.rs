//! Permission commands: `permissions ls|create|delete`

use owo_colors::OwoColorize;

use super::groups::PermissionRow;
use super::{print_json, print_table, run_mutation};
use crate::api::PermissionInput;
use crate::desk::Desk;
use crate::error::Result;
use crate::forms::{Mutation, validate_permission};
use crate::query::Query;
use crate::screens::PERMISSIONS;

pub async fn cmd_permissions_ls(filters: &Query, json: bool) -> Result<()> {
    let desk = Desk::connect()?;
    let key = PERMISSIONS.list_key(filters);
    let page = desk
        .client
        .list_permissions(&PERMISSIONS.request_params(&key))
        .await
        .inspect_err(|e| desk.check_unauthorized(e))?;

    if json {
        return print_json(&page.items);
    }

    let count = page.items.len();
    let rows: Vec<PermissionRow> = page.items.iter().map(PermissionRow::from).collect();
    print_table(rows, "No permissions found");
    if count > 0 {
        println!("{}", format!("{count} permissions").dimmed());
    }
    Ok(())
}

pub async fn cmd_permission_create(input: PermissionInput) -> Result<()> {
    validate_permission(&input)?;
    let desk = Desk::connect()?;
    run_mutation(
        &desk,
        Mutation::CreatePermission,
        desk.client.create_permission(&input),
    )
    .await
}

pub async fn cmd_permission_delete(id: i64) -> Result<()> {
    let desk = Desk::connect()?;
    run_mutation(
        &desk,
        Mutation::DeletePermission,
        desk.client.delete_permission(id),
    )
    .await
}
