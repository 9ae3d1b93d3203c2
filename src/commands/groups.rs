//! Group commands: `groups ls|show|create|update|delete`

use futures::future::try_join;
use owo_colors::OwoColorize;
use serde_json::json;
use tabled::Tabled;

use super::{format_flag, format_optional, print_json, print_table, run_mutation};
use crate::api::{Group, GroupInput, Permission};
use crate::desk::Desk;
use crate::error::{DeskError, Result};
use crate::forms::{Mutation, validate_group};
use crate::query::Query;
use crate::screens::{PERMISSIONS, catalogue_query};

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Permissions")]
    permissions: usize,
}

impl From<&Group> for GroupRow {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            name: group.name.clone(),
            description: format_optional(group.description.as_deref()),
            permissions: group.permissions.len(),
        }
    }
}

#[derive(Tabled)]
pub(super) struct PermissionRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
}

impl From<&Permission> for PermissionRow {
    fn from(p: &Permission) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            resource: p.resource.clone(),
            action: p.action.clone(),
            method: format_optional(p.method.as_deref()),
            endpoint: format_optional(p.endpoint.as_deref()),
        }
    }
}

/// List active groups, followed by the permission catalogue when filters
/// were given
pub async fn cmd_groups_ls(filters: &Query, json: bool) -> Result<()> {
    let desk = Desk::connect()?;

    let catalogue = async {
        if filters.is_empty() {
            return Ok(None);
        }
        let query = catalogue_query(filters);
        let params = PERMISSIONS.request_params(&PERMISSIONS.list_key(&query));
        let page = desk.client.list_permissions(&params).await?;
        Ok::<_, DeskError>(Some(page.items))
    };
    let (groups, catalogue) = try_join(desk.client.active_groups(), catalogue)
        .await
        .inspect_err(|e| desk.check_unauthorized(e))?;

    if json {
        return print_json(&json!({
            "groups": groups,
            "catalogue": catalogue,
        }));
    }

    let rows: Vec<GroupRow> = groups.iter().map(GroupRow::from).collect();
    print_table(rows, "No active groups");

    if let Some(catalogue) = catalogue {
        println!("\n{} ({})", "Permission catalogue".cyan().bold(), filters);
        let rows: Vec<PermissionRow> = catalogue.iter().map(PermissionRow::from).collect();
        print_table(rows, "No permissions match");
    }
    Ok(())
}

pub async fn cmd_group_show(id: i64, json: bool) -> Result<()> {
    let desk = Desk::connect()?;
    let group = desk.client.get_group(id).await.inspect_err(|e| {
        desk.check_unauthorized(e);
    })?;

    if json {
        return print_json(&group);
    }

    println!("{} {}", format!("#{}", group.id).cyan(), group.name.bold());
    if let Some(description) = group.description.as_deref().filter(|d| !d.is_empty()) {
        println!("{description}");
    }
    println!("active: {}\n", format_flag(group.is_active));
    let rows: Vec<PermissionRow> = group.permissions.iter().map(PermissionRow::from).collect();
    print_table(rows, "Group has no permissions");
    Ok(())
}

pub async fn cmd_group_create(
    name: String,
    description: String,
    permission_ids: Vec<i64>,
) -> Result<()> {
    let input = GroupInput {
        name,
        description,
        permission_ids,
    };
    validate_group(&input)?;
    let desk = Desk::connect()?;
    run_mutation(&desk, Mutation::CreateGroup, desk.client.create_group(&input)).await
}

/// Update a group; omitted fields keep their current value
pub async fn cmd_group_update(
    id: i64,
    name: Option<String>,
    description: Option<String>,
    permission_ids: Option<Vec<i64>>,
) -> Result<()> {
    let desk = Desk::connect()?;
    let current = desk.client.get_group(id).await.inspect_err(|e| {
        desk.check_unauthorized(e);
    })?;

    let input = GroupInput {
        name: name.unwrap_or_else(|| current.name.clone()),
        description: description
            .or_else(|| current.description.clone())
            .unwrap_or_default(),
        permission_ids: permission_ids.unwrap_or_else(|| current.permission_ids()),
    };
    validate_group(&input)?;
    run_mutation(&desk, Mutation::UpdateGroup, desk.client.update_group(id, &input)).await
}

pub async fn cmd_group_delete(id: i64) -> Result<()> {
    let desk = Desk::connect()?;
    run_mutation(&desk, Mutation::DeleteGroup, desk.client.delete_group(id)).await
}
