use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;

use crate::screens::{ACTIONS, ORDERINGS, RESOURCES};

#[derive(Parser)]
#[command(name = "deltadesk")]
#[command(about = "Administrative console for the Delta backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        /// Account name
        #[arg(short, long)]
        username: String,

        /// Password (read from stdin when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Discard the stored session
    Logout,

    /// Show the signed-in user and session expiry
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a location in the interactive console (e.g. /home/admin?search=bob)
    #[command(visible_alias = "o")]
    Open {
        /// Path with optional query string
        #[arg(default_value = "/home/admin", value_parser = parse_location)]
        location: String,
    },

    /// Manage user accounts
    #[command(subcommand)]
    Users(UsersAction),

    /// Manage permission groups
    #[command(subcommand)]
    Groups(GroupsAction),

    /// Manage permissions
    #[command(subcommand)]
    Permissions(PermissionsAction),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigAction),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for [possible values: bash, zsh, fish, powershell, elvish]
        shell: Shell,
    },
}

/// Fields shared by `users create` and `users update`
#[derive(Args, Debug, Clone)]
pub struct UserFields {
    /// Login name
    #[arg(long)]
    pub user_name: String,

    /// Display name
    #[arg(long)]
    pub full_name: String,

    /// Password
    #[arg(long)]
    pub password: String,

    /// Account active flag
    #[arg(long, default_value = "true", value_parser = parse_bool_strict)]
    pub active: bool,

    /// Grant superuser rights
    #[arg(long)]
    pub superuser: bool,
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List users
    #[command(visible_alias = "ls")]
    List {
        /// Search by user name
        #[arg(short, long)]
        search: Option<String>,

        /// Include active and inactive users
        #[arg(long, conflicts_with = "inactive")]
        all_states: bool,

        /// Only inactive users
        #[arg(long)]
        inactive: bool,

        /// Sort order: user_name, created_at
        #[arg(long, value_parser = parse_ordering)]
        ordering: Option<String>,

        /// Number of pages to load
        #[arg(long, default_value = "1")]
        pages: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a user
    Create {
        #[command(flatten)]
        fields: UserFields,

        /// Initial group ids
        #[arg(long = "group", value_delimiter = ',')]
        groups: Vec<i64>,
    },

    /// Update a user
    Update {
        /// User id
        id: i64,

        #[command(flatten)]
        fields: UserFields,
    },

    /// Deactivate a user
    Delete {
        /// User id
        id: i64,
    },

    /// Show the groups attached to a user
    Permissions {
        /// User id
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change the groups attached to a user
    Assign {
        /// User id
        id: i64,

        /// Group ids to add
        #[arg(long = "add", value_delimiter = ',')]
        add: Vec<i64>,

        /// Group ids to remove
        #[arg(long = "remove", value_delimiter = ',')]
        remove: Vec<i64>,
    },
}

#[derive(Subcommand)]
pub enum GroupsAction {
    /// List active groups
    #[command(visible_alias = "ls")]
    List {
        /// Filter the permission catalogue shown under each group by name
        #[arg(long)]
        name: Option<String>,

        /// Filter the permission catalogue by resource
        #[arg(long, value_parser = parse_resource)]
        resource: Option<String>,

        /// Filter the permission catalogue by action
        #[arg(long, value_parser = parse_action)]
        action: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one group and its permissions
    Show {
        /// Group id
        id: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a group
    Create {
        /// Group name
        #[arg(long)]
        name: String,

        /// Description
        #[arg(long, default_value = "")]
        description: String,

        /// Permission ids
        #[arg(long = "permission", value_delimiter = ',')]
        permissions: Vec<i64>,
    },

    /// Update a group
    Update {
        /// Group id
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(long)]
        description: Option<String>,

        /// Replace the permission ids
        #[arg(long = "permission", value_delimiter = ',')]
        permissions: Option<Vec<i64>>,
    },

    /// Delete a group
    Delete {
        /// Group id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum PermissionsAction {
    /// List permissions
    #[command(visible_alias = "ls")]
    List {
        /// Filter by name
        #[arg(long)]
        name: Option<String>,

        /// Filter by description
        #[arg(long)]
        description: Option<String>,

        /// Filter by endpoint
        #[arg(long)]
        endpoint: Option<String>,

        /// Filter by HTTP method
        #[arg(long)]
        method: Option<String>,

        /// Filter by resource
        #[arg(long, value_parser = parse_resource)]
        resource: Option<String>,

        /// Filter by action
        #[arg(long, value_parser = parse_action)]
        action: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a permission
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        resource: String,

        #[arg(long)]
        action: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        endpoint: String,

        #[arg(long, default_value = "")]
        method: String,
    },

    /// Delete a permission
    Delete {
        /// Permission id
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a configuration value
    Set {
        /// Key in dot notation (e.g. list.page_size)
        key: String,

        /// New value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Key in dot notation (e.g. api.url)
        key: String,
    },
}

impl Commands {
    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            UserListOptions, cmd_config_get, cmd_config_set, cmd_config_show, cmd_group_create,
            cmd_group_delete, cmd_group_show, cmd_group_update, cmd_groups_ls, cmd_login,
            cmd_logout, cmd_open, cmd_permission_create, cmd_permission_delete,
            cmd_permissions_ls, cmd_user_assign, cmd_user_create, cmd_user_delete,
            cmd_user_permissions, cmd_user_update, cmd_users_ls, cmd_whoami,
        };
        use crate::query::{FieldValue, Query};

        match self {
            Commands::Login { username, password } => cmd_login(&username, password).await,
            Commands::Logout => cmd_logout(),
            Commands::Whoami { json } => cmd_whoami(json),
            Commands::Open { location } => cmd_open(&location).await,

            Commands::Users(action) => match action {
                UsersAction::List {
                    search,
                    all_states,
                    inactive,
                    ordering,
                    pages,
                    json,
                } => {
                    let active = if all_states {
                        None
                    } else {
                        Some(!inactive)
                    };
                    cmd_users_ls(UserListOptions {
                        search,
                        active,
                        ordering,
                        pages,
                        json,
                    })
                    .await
                }
                UsersAction::Create { fields, groups } => cmd_user_create(fields, &groups).await,
                UsersAction::Update { id, fields } => cmd_user_update(id, fields).await,
                UsersAction::Delete { id } => cmd_user_delete(id).await,
                UsersAction::Permissions { id, json } => cmd_user_permissions(id, json).await,
                UsersAction::Assign { id, add, remove } => cmd_user_assign(id, &add, &remove).await,
            },

            Commands::Groups(action) => match action {
                GroupsAction::List {
                    name,
                    resource,
                    action,
                    json,
                } => {
                    let filters = [("name", name), ("resource", resource), ("action", action)]
                        .into_iter()
                        .filter_map(|(field, value)| {
                            value.map(|v| (field.to_string(), FieldValue::from(v)))
                        })
                        .collect::<Query>();
                    cmd_groups_ls(&filters, json).await
                }
                GroupsAction::Show { id, json } => cmd_group_show(id, json).await,
                GroupsAction::Create {
                    name,
                    description,
                    permissions,
                } => cmd_group_create(name, description, permissions).await,
                GroupsAction::Update {
                    id,
                    name,
                    description,
                    permissions,
                } => cmd_group_update(id, name, description, permissions).await,
                GroupsAction::Delete { id } => cmd_group_delete(id).await,
            },

            Commands::Permissions(action) => match action {
                PermissionsAction::List {
                    name,
                    description,
                    endpoint,
                    method,
                    resource,
                    action,
                    json,
                } => {
                    let filters = [
                        ("name", name),
                        ("description", description),
                        ("endpoint", endpoint),
                        ("method", method),
                        ("resource", resource),
                        ("action", action),
                    ]
                    .into_iter()
                    .filter_map(|(field, value)| {
                        value.map(|v| (field.to_string(), FieldValue::from(v)))
                    })
                    .collect::<Query>();
                    cmd_permissions_ls(&filters, json).await
                }
                PermissionsAction::Create {
                    name,
                    resource,
                    action,
                    description,
                    endpoint,
                    method,
                } => {
                    cmd_permission_create(crate::api::PermissionInput {
                        name,
                        resource,
                        action,
                        description,
                        endpoint,
                        method,
                    })
                    .await
                }
                PermissionsAction::Delete { id } => cmd_permission_delete(id).await,
            },

            Commands::Config(action) => match action {
                ConfigAction::Show { json } => cmd_config_show(json),
                ConfigAction::Set { key, value } => cmd_config_set(&key, &value),
                ConfigAction::Get { key } => cmd_config_get(&key),
            },

            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

/// Generic validation helper for parsing values with a standard error message format.
fn parse_one_of(s: &str, field_name: &str, valid_values: &[&str]) -> Result<String, String> {
    let lowered = s.trim().to_lowercase();
    if valid_values.contains(&lowered.as_str()) {
        Ok(lowered)
    } else {
        Err(format!(
            "Invalid {}. Must be one of: {}",
            field_name,
            valid_values.join(", ")
        ))
    }
}

fn parse_resource(s: &str) -> Result<String, String> {
    parse_one_of(s, "resource", RESOURCES)
}

fn parse_action(s: &str) -> Result<String, String> {
    parse_one_of(s, "action", ACTIONS)
}

fn parse_ordering(s: &str) -> Result<String, String> {
    parse_one_of(s, "ordering", ORDERINGS)
}

fn parse_bool_strict(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!(
            "Invalid boolean value '{s}'. Must be 'true' or 'false'"
        )),
    }
}

fn parse_location(s: &str) -> Result<String, String> {
    crate::router::Location::parse(s)
        .map(|_| s.to_string())
        .map_err(|e| e.to_string())
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "deltadesk", &mut io::stdout());
}
