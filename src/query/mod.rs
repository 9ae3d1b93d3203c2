//! Canonical filter query for list screens.
//!
//! A [`Query`] maps filter-field names (`search`, `filterActive`, `ordering`,
//! `resource`, ...) to values. Empty values are never stored, so two queries
//! built from the same effective filters compare equal no matter how they were
//! assembled, and their serialized form never carries `field=` entries.

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

/// Value of a single filter field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    /// Absent values are dropped from a query instead of being stored
    pub fn is_absent(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Flag(_) => false,
        }
    }

    /// Wire form used in URL query strings and request parameters
    pub fn as_param(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Flag(b) => b.to_string(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

/// Normalized, structurally comparable set of active filter fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Query {
    fields: BTreeMap<String, FieldValue>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, Some(value.into()));
        self
    }

    /// Set or clear a field. Absent values remove the field.
    ///
    /// Returns true when the query changed.
    pub fn set(&mut self, name: &str, value: Option<FieldValue>) -> bool {
        match value.filter(|v| !v.is_absent()) {
            Some(v) => self.fields.insert(name.to_string(), v.clone()) != Some(v),
            None => self.fields.remove(name).is_some(),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.fields.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Text value of a field, or "" when absent
    pub fn text(&self, name: &str) -> &str {
        self.fields
            .get(name)
            .and_then(FieldValue::as_text)
            .unwrap_or("")
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.fields.get(name).and_then(FieldValue::as_flag)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Sub-query containing only the named fields
    pub fn project(&self, names: &[&str]) -> Query {
        Query {
            fields: self
                .fields
                .iter()
                .filter(|(k, _)| names.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Fields among `names` whose value differs between `self` and `other`.
    ///
    /// Each entry carries the value from `other` (None when `other` lacks it).
    pub fn changes_to(&self, other: &Query, names: &[&str]) -> Vec<(String, Option<FieldValue>)> {
        names
            .iter()
            .filter(|name| self.get(name) != other.get(name))
            .map(|name| (name.to_string(), other.get(name).cloned()))
            .collect()
    }

    /// Serialize as `application/x-www-form-urlencoded`, keys in sorted order
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter().map(|(k, v)| (k.as_str(), v.as_param())))
            .finish()
    }

    /// Parse a query string. Fields listed in `flag_fields` are read as
    /// booleans when their value is `true` or `false`; everything else is text.
    pub fn parse(query_string: &str, flag_fields: &[&str]) -> Query {
        let mut query = Query::new();
        let trimmed = query_string.trim_start_matches('?');
        for (key, value) in form_urlencoded::parse(trimmed.as_bytes()) {
            let field_value = if flag_fields.contains(&key.as_ref()) {
                match value.as_ref() {
                    "true" => FieldValue::Flag(true),
                    "false" => FieldValue::Flag(false),
                    other => FieldValue::Text(other.to_string()),
                }
            } else {
                FieldValue::Text(value.into_owned())
            };
            query.set(&key, Some(field_value));
        }
        query
    }

    /// Cache key derived from the normalized serialization
    pub fn cache_key(&self, resource: &str) -> String {
        format!("{}?{}", resource, self.to_query_string())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_query_string())
    }
}

impl FromIterator<(String, FieldValue)> for Query {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        let mut query = Query::new();
        for (k, v) in iter {
            query.set(&k, Some(v));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = Query::new().with("search", "bob").with("ordering", "user_name");
        let b = Query::new().with("ordering", "user_name").with("search", "bob");
        assert_eq!(a, b);
        assert_eq!(a.cache_key("user"), b.cache_key("user"));
    }

    #[test]
    fn test_empty_values_are_omitted() {
        let mut q = Query::new().with("search", "bob");
        assert!(q.set("search", Some(FieldValue::from(""))));
        assert!(q.is_empty());
        assert_eq!(q.to_query_string(), "");

        let q = Query::new().with("name", "   ").with("action", "read");
        assert!(!q.contains("name"));
        assert_eq!(q.to_query_string(), "action=read");
    }

    #[test]
    fn test_set_reports_changes() {
        let mut q = Query::new();
        assert!(q.set("resource", Some("user".into())));
        assert!(!q.set("resource", Some("user".into())));
        assert!(q.set("resource", Some("group".into())));
        assert!(!q.set("missing", None));
    }

    #[test]
    fn test_parse_flags_and_text() {
        let q = Query::parse("?filterActive=false&search=jo+hn&ordering=", &["filterActive"]);
        assert_eq!(q.flag("filterActive"), Some(false));
        assert_eq!(q.text("search"), "jo hn");
        assert!(!q.contains("ordering"));
    }

    #[test]
    fn test_parse_flag_field_with_non_boolean_value_stays_text() {
        let q = Query::parse("filterActive=maybe", &["filterActive"]);
        assert_eq!(q.get("filterActive"), Some(&FieldValue::Text("maybe".into())));
    }

    #[test]
    fn test_query_string_encodes_reserved_characters() {
        let q = Query::new().with("endpoint", "/api/v1/user?x=1&y");
        let s = q.to_query_string();
        assert_eq!(s, "endpoint=%2Fapi%2Fv1%2Fuser%3Fx%3D1%26y");
        assert_eq!(Query::parse(&s, &[]), q);
    }

    #[test]
    fn test_changes_to_only_considers_named_fields() {
        let persisted = Query::new().with("name", "a").with("resource", "user");
        let debounced = Query::new().with("name", "b").with("description", "d");
        let changes = persisted.changes_to(&debounced, &["name", "description", "endpoint"]);
        assert_eq!(
            changes,
            vec![
                ("name".to_string(), Some(FieldValue::from("b"))),
                ("description".to_string(), Some(FieldValue::from("d"))),
            ]
        );
    }

    #[test]
    fn test_project() {
        let q = Query::new().with("a", "1").with("b", "2").with("c", true);
        let p = q.project(&["a", "c"]);
        assert_eq!(p, Query::new().with("a", "1").with("c", true));
    }
}
