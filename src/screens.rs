//! Field layout of the three admin list screens.
//!
//! Each [`ScreenSpec`] says which filter fields are typed (and therefore
//! debounced), which are picked from a fixed set of choices and written
//! straight through, and how the persisted fields map onto request
//! parameters.

use crate::query::{FieldValue, Query};
use crate::router::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenId {
    Users,
    Permissions,
    Groups,
}

/// Fixed options for a direct field. `""` stands for "no filter".
#[derive(Debug)]
pub struct Choice {
    pub field: &'static str,
    pub label: &'static str,
    pub options: &'static [&'static str],
}

#[derive(Debug)]
pub struct ScreenSpec {
    pub id: ScreenId,
    pub route: Route,
    /// API path segment, also the page cache prefix
    pub resource: &'static str,
    /// Typed fields, synchronized through the debouncer
    pub debounced_fields: &'static [&'static str],
    /// Dropdown-style fields, written immediately
    pub direct_fields: &'static [&'static str],
    /// Fields whose values are booleans
    pub flag_fields: &'static [&'static str],
    /// Persisted field -> request parameter, for the fields that key the list
    pub params: &'static [(&'static str, &'static str)],
    /// Values assumed when a keyed field is absent
    pub defaults: &'static [(&'static str, &'static str)],
    pub choices: &'static [Choice],
    /// Whether the endpoint understands `page` / `page_size`
    pub paginated: bool,
}

pub const RESOURCES: &[&str] = &["user", "installation", "measurement", "logistic", "invoice"];
pub const ACTIONS: &[&str] = &["create", "read", "update", "delete"];
pub const ORDERINGS: &[&str] = &["user_name", "created_at"];

pub static USERS: ScreenSpec = ScreenSpec {
    id: ScreenId::Users,
    route: Route::Users,
    resource: "user",
    debounced_fields: &["search"],
    direct_fields: &["filterActive", "ordering"],
    flag_fields: &["filterActive"],
    params: &[
        ("search", "user_name_filter"),
        ("filterActive", "is_active"),
        ("ordering", "ordering"),
    ],
    defaults: &[("filterActive", "true")],
    choices: &[
        Choice {
            field: "filterActive",
            label: "Status",
            options: &["true", "false"],
        },
        Choice {
            field: "ordering",
            label: "Sort",
            options: &["", "user_name", "created_at"],
        },
    ],
    paginated: true,
};

pub static PERMISSIONS: ScreenSpec = ScreenSpec {
    id: ScreenId::Permissions,
    route: Route::Permissions,
    resource: "permissions",
    debounced_fields: &["name", "description", "endpoint", "method"],
    direct_fields: &["resource", "action"],
    flag_fields: &[],
    params: &[
        ("resource", "resource"),
        ("action", "action"),
        ("name", "name"),
        ("description", "description"),
        ("endpoint", "endpoint"),
        ("method", "method"),
    ],
    defaults: &[],
    choices: &[
        Choice {
            field: "resource",
            label: "Resource",
            options: &["", "user", "installation", "measurement", "logistic", "invoice"],
        },
        Choice {
            field: "action",
            label: "Action",
            options: &["", "create", "read", "update", "delete"],
        },
    ],
    paginated: false,
};

/// The group list itself is unfiltered; its fields select the permission
/// catalogue offered while composing a group.
pub static GROUPS: ScreenSpec = ScreenSpec {
    id: ScreenId::Groups,
    route: Route::GroupPermissions,
    resource: "groups",
    debounced_fields: &["name"],
    direct_fields: &["resource", "action"],
    flag_fields: &[],
    params: &[],
    defaults: &[],
    choices: &[
        Choice {
            field: "resource",
            label: "Resource",
            options: &["", "user", "installation", "measurement", "logistic", "invoice"],
        },
        Choice {
            field: "action",
            label: "Action",
            options: &["", "create", "read", "update", "delete"],
        },
    ],
    paginated: false,
};

pub static ALL: [&ScreenSpec; 3] = [&USERS, &PERMISSIONS, &GROUPS];

pub fn for_route(route: Route) -> Option<&'static ScreenSpec> {
    ALL.into_iter().find(|s| s.route == route)
}

impl ScreenSpec {
    pub fn is_flag(&self, field: &str) -> bool {
        self.flag_fields.contains(&field)
    }

    pub fn is_debounced(&self, field: &str) -> bool {
        self.debounced_fields.contains(&field)
    }

    pub fn is_direct(&self, field: &str) -> bool {
        self.direct_fields.contains(&field)
    }

    pub fn choice(&self, field: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.field == field)
    }

    /// Typed form of a raw value for `field`. Empty input means "absent".
    pub fn value(&self, field: &str, raw: &str) -> Option<FieldValue> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if self.is_flag(field) {
            match raw {
                "true" => return Some(FieldValue::Flag(true)),
                "false" => return Some(FieldValue::Flag(false)),
                _ => {}
            }
        }
        Some(FieldValue::Text(raw.to_string()))
    }

    /// The query that keys the list: only the fields sent to the endpoint,
    /// with defaults filled in. Two locations that fetch the same data give
    /// equal keys.
    pub fn list_key(&self, persisted: &Query) -> Query {
        let fields: Vec<&str> = self.params.iter().map(|(f, _)| *f).collect();
        let mut key = persisted.project(&fields);
        for (field, default) in self.defaults {
            if !key.contains(field) {
                key.set(field, self.value(field, default));
            }
        }
        key
    }

    /// Request parameters for a list key
    pub fn request_params(&self, key: &Query) -> Vec<(&'static str, String)> {
        self.params
            .iter()
            .filter_map(|(field, param)| key.get(field).map(|v| (*param, v.as_param())))
            .collect()
    }

    /// Option after the current one for a direct field, wrapping around
    pub fn next_choice(&self, field: &str, current: Option<&FieldValue>) -> Option<FieldValue> {
        let choice = self.choice(field)?;
        if choice.options.is_empty() {
            return None;
        }
        let current = current.map(FieldValue::as_param).unwrap_or_default();
        let idx = choice
            .options
            .iter()
            .position(|o| *o == current)
            .map_or(0, |i| (i + 1) % choice.options.len());
        self.value(field, choice.options[idx])
    }
}

/// Permission-list query selected by the group screen's filters
pub fn catalogue_query(group_filters: &Query) -> Query {
    group_filters.project(&["name", "resource", "action"])
}
