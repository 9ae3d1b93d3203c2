//! User commands: `users ls|create|update|delete|permissions|assign`

use owo_colors::OwoColorize;
use tabled::Tabled;
use tracing::debug;

use super::{format_flag, format_optional, print_json, print_table, run_mutation};
use crate::api::{User, UserInput, UserPermission};
use crate::cli::UserFields;
use crate::desk::Desk;
use crate::error::{DeskError, Result};
use crate::forms::{Mutation, merge_assignment, validate_user};
use crate::pagination::PageCursor;
use crate::query::Query;
use crate::screens::USERS;

pub struct UserListOptions {
    pub search: Option<String>,
    /// `None` lists users in every state
    pub active: Option<bool>,
    pub ordering: Option<String>,
    pub pages: u32,
    pub json: bool,
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "User name")]
    user_name: String,
    #[tabled(rename = "Full name")]
    full_name: String,
    #[tabled(rename = "Active")]
    active: String,
    #[tabled(rename = "Superuser")]
    superuser: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name.clone(),
            full_name: user.full_name.clone(),
            active: format_flag(user.is_active),
            superuser: format_flag(user.is_superuser),
        }
    }
}

#[derive(Tabled)]
struct GroupMembershipRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Group")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Active")]
    active: String,
}

impl From<&UserPermission> for GroupMembershipRow {
    fn from(p: &UserPermission) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: format_optional(p.description.as_deref()),
            active: format_flag(p.is_active),
        }
    }
}

impl From<UserFields> for UserInput {
    fn from(fields: UserFields) -> Self {
        Self {
            user_name: fields.user_name,
            full_name: fields.full_name,
            password: fields.password,
            is_active: fields.active,
            is_superuser: fields.superuser,
        }
    }
}

/// List users, loading up to `pages` pages
pub async fn cmd_users_ls(options: UserListOptions) -> Result<()> {
    let desk = Desk::connect()?;

    let mut filters = Query::new();
    if let Some(search) = &options.search {
        filters.set("search", USERS.value("search", search));
    }
    if let Some(ordering) = &options.ordering {
        filters.set("ordering", USERS.value("ordering", ordering));
    }
    if let Some(active) = options.active {
        filters.set("filterActive", Some(active.into()));
    }

    let key = USERS.list_key(&filters);
    let mut params = USERS.request_params(&key);
    if options.active.is_none() {
        params.retain(|(param, _)| *param != "is_active");
    }

    let page_size = desk.config.list.page_size;
    let mut cursor: PageCursor<User> = PageCursor::new();
    let mut ticket = cursor.set_query(key);

    while let Some(current) = ticket.take() {
        debug!(page = current.page, "loading users page");
        let result = desk
            .client
            .list_users(current.page, page_size, &params)
            .await;
        if let Err(e) = &result {
            desk.check_unauthorized(e);
        }
        let result = result.map_err(|e| e.to_string());
        let failure = result.as_ref().err().cloned();
        cursor.complete(&current, result);

        if let Some(message) = failure {
            return Err(DeskError::Other(format!("Failed to load users: {message}")));
        }
        if cursor.pages_loaded() < options.pages.max(1) {
            ticket = cursor.fetch_next_page();
        }
    }

    if options.json {
        return print_json(cursor.items());
    }

    let rows: Vec<UserRow> = cursor.items().iter().map(UserRow::from).collect();
    print_table(rows, "No users found");

    if let Some(total) = cursor.total_count() {
        let mut footer = format!("{} of {} users", cursor.items().len(), total);
        if cursor.has_next_page() {
            footer.push_str(&format!(
                " (more with --pages {})",
                cursor.pages_loaded() + 1
            ));
        }
        println!("{}", footer.dimmed());
    }
    Ok(())
}

/// Create a user with optional initial groups
pub async fn cmd_user_create(fields: UserFields, group_ids: &[i64]) -> Result<()> {
    let input = UserInput::from(fields);
    validate_user(&input)?;
    let desk = Desk::connect()?;
    run_mutation(
        &desk,
        Mutation::CreateUser,
        desk.client.create_user(&input, group_ids),
    )
    .await
}

pub async fn cmd_user_update(id: i64, fields: UserFields) -> Result<()> {
    let input = UserInput::from(fields);
    validate_user(&input)?;
    let desk = Desk::connect()?;
    run_mutation(&desk, Mutation::UpdateUser, desk.client.update_user(id, &input)).await
}

pub async fn cmd_user_delete(id: i64) -> Result<()> {
    let desk = Desk::connect()?;
    run_mutation(&desk, Mutation::DeleteUser, desk.client.delete_user(id)).await
}

/// Show the groups attached to a user
pub async fn cmd_user_permissions(id: i64, json: bool) -> Result<()> {
    let desk = Desk::connect()?;
    let groups = desk.client.user_permissions(id).await.inspect_err(|e| {
        desk.check_unauthorized(e);
    })?;

    if json {
        return print_json(&groups);
    }
    let rows: Vec<GroupMembershipRow> = groups.iter().map(GroupMembershipRow::from).collect();
    print_table(rows, "User has no groups");
    Ok(())
}

/// Add and remove groups on a user, keeping the rest of its active groups
pub async fn cmd_user_assign(id: i64, add: &[i64], remove: &[i64]) -> Result<()> {
    if add.is_empty() && remove.is_empty() {
        return Err(DeskError::Other(
            "nothing to change: pass --add and/or --remove".to_string(),
        ));
    }

    let desk = Desk::connect()?;
    let current = desk.client.user_permissions(id).await.inspect_err(|e| {
        desk.check_unauthorized(e);
    })?;
    let group_ids = merge_assignment(&current, remove, add);
    debug!(user = id, ?group_ids, "assigning groups");

    run_mutation(
        &desk,
        Mutation::AssignGroups,
        desk.client.assign_groups(id, &group_ids),
    )
    .await
}
