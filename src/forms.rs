//! Mutation forms: client-side validation, server error mapping and the group
//! assignment merge.

use crate::api::types::{GroupInput, PermissionInput, UserInput, UserPermission};
use crate::error::{DeskError, FieldErrors, Result};
use crate::screens::{ACTIONS, RESOURCES};

pub const REQUIRED: &str = "This field is required";

fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), message.to_string());
    }
}

fn finish(errors: FieldErrors) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DeskError::Validation(errors))
    }
}

pub fn validate_user(input: &UserInput) -> Result<()> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "user_name", &input.user_name, "Please enter a username");
    require(&mut errors, "full_name", &input.full_name, "Please enter a full name");
    require(&mut errors, "password", &input.password, "Please enter a password");
    finish(errors)
}

pub fn validate_permission(input: &PermissionInput) -> Result<()> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "name", &input.name, REQUIRED);
    require(&mut errors, "resource", &input.resource, REQUIRED);
    require(&mut errors, "action", &input.action, REQUIRED);

    if !input.resource.trim().is_empty() && !RESOURCES.contains(&input.resource.trim()) {
        errors.insert(
            "resource".to_string(),
            format!("Must be one of: {}", RESOURCES.join(", ")),
        );
    }
    if !input.action.trim().is_empty() && !ACTIONS.contains(&input.action.trim()) {
        errors.insert(
            "action".to_string(),
            format!("Must be one of: {}", ACTIONS.join(", ")),
        );
    }
    finish(errors)
}

pub fn validate_group(input: &GroupInput) -> Result<()> {
    let mut errors = FieldErrors::new();
    require(&mut errors, "name", &input.name, REQUIRED);
    finish(errors)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateUser,
    UpdateUser,
    DeleteUser,
    AssignGroups,
    CreateGroup,
    UpdateGroup,
    DeleteGroup,
    CreatePermission,
    DeletePermission,
}

impl Mutation {
    pub fn success_message(self) -> &'static str {
        match self {
            Mutation::CreateUser => "User added successfully!",
            Mutation::UpdateUser => "User updated successfully!",
            Mutation::DeleteUser => "User deleted successfully!",
            Mutation::AssignGroups => "Permission updated successfully!",
            Mutation::CreateGroup => "Group created successfully!",
            Mutation::UpdateGroup => "Group updated successfully!",
            Mutation::DeleteGroup => "Group deleted successfully!",
            Mutation::CreatePermission => "Permission added successfully!",
            Mutation::DeletePermission => "Permission deleted successfully!",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Mutation::CreateUser => "Failed to save user!",
            Mutation::UpdateUser => "Failed to update user!",
            Mutation::DeleteUser => "Failed to delete user!",
            Mutation::AssignGroups => "Failed to update permissions! Please try again.",
            Mutation::CreateGroup => "Failed to create group.",
            Mutation::UpdateGroup => "Failed to update group.",
            Mutation::DeleteGroup => "Failed to delete group.",
            Mutation::CreatePermission => "Failed to add permission.",
            Mutation::DeletePermission => "Failed to delete permission.",
        }
    }

    /// Page cache prefixes whose lists a successful mutation changes
    pub fn invalidates(self) -> &'static [&'static str] {
        match self {
            Mutation::CreateUser
            | Mutation::UpdateUser
            | Mutation::DeleteUser
            | Mutation::AssignGroups => &["user"],
            Mutation::CreateGroup | Mutation::UpdateGroup | Mutation::DeleteGroup => {
                &["groups", "user"]
            }
            Mutation::CreatePermission | Mutation::DeletePermission => &["permissions"],
        }
    }

    fn is_user_form(self) -> bool {
        matches!(self, Mutation::CreateUser | Mutation::UpdateUser)
    }
}

/// What to show after a failed mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationFailure {
    /// Messages to place next to the offending inputs
    Fields(FieldErrors),
    /// A single notification
    Message(String),
}

impl MutationFailure {
    /// Collapse into an error for the command line
    pub fn into_error(self) -> DeskError {
        match self {
            MutationFailure::Fields(errors) => DeskError::Validation(errors),
            MutationFailure::Message(message) => DeskError::Other(message),
        }
    }
}

/// Map a failed mutation to field messages when the server says which field
/// failed, otherwise to a single message.
pub fn map_mutation_error(mutation: Mutation, error: &DeskError) -> MutationFailure {
    let api = match error {
        DeskError::Validation(errors) => return MutationFailure::Fields(errors.clone()),
        DeskError::Api(api) => api,
        _ => return MutationFailure::Message(mutation.failure_message().to_string()),
    };

    if !api.issues.is_empty() {
        let fields = api
            .issues
            .iter()
            .map(|issue| (issue.field.clone(), issue.message.clone()))
            .collect();
        return MutationFailure::Fields(fields);
    }

    if api.is_bad_request() {
        if mutation.is_user_form() {
            let mut fields = FieldErrors::new();
            fields.insert(
                "user_name".to_string(),
                "User with this username already exists".to_string(),
            );
            return MutationFailure::Fields(fields);
        }
        if let Some(detail) = &api.detail {
            return MutationFailure::Message(detail.clone());
        }
    }

    if mutation == Mutation::CreatePermission
        && let Some(detail) = &api.detail
    {
        return MutationFailure::Message(detail.clone());
    }

    MutationFailure::Message(mutation.failure_message().to_string())
}

/// Group ids to send when saving a user's groups: the user's active groups
/// minus the ones removed, plus the newly selected ones, without duplicates.
pub fn merge_assignment(current: &[UserPermission], removed: &[i64], selected: &[i64]) -> Vec<i64> {
    let mut merged: Vec<i64> = Vec::new();
    let kept = current
        .iter()
        .filter(|p| p.is_active && !removed.contains(&p.id))
        .map(|p| p.id);
    for id in kept.chain(selected.iter().copied()) {
        if !merged.contains(&id) {
            merged.push(id);
        }
    }
    merged
}
