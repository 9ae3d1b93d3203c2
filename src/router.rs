//! Routes, locations and the navigation seam.
//!
//! A [`Location`] is the terminal rendition of a browser URL: a route plus the
//! query string that persists a list screen's filters. List screens read their
//! canonical query back from the [`Navigator`] and write it only through
//! [`Navigator::replace_query`].

use std::fmt;
use std::str::FromStr;

use jiff::Timestamp;

use crate::error::{DeskError, Result};
use crate::query::Query;
use crate::screens::{self, ScreenSpec};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Dashboard,
    ProjectManagement,
    Tracking,
    DeliveryOrder,
    Files,
    Users,
    GroupPermissions,
    Permissions,
}

impl Route {
    pub const ALL: [Route; 9] = [
        Route::Login,
        Route::Dashboard,
        Route::ProjectManagement,
        Route::Tracking,
        Route::DeliveryOrder,
        Route::Files,
        Route::Users,
        Route::GroupPermissions,
        Route::Permissions,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Dashboard => "/home/dashboard",
            Route::ProjectManagement => "/home/projectmanagement",
            Route::Tracking => "/home/tracking",
            Route::DeliveryOrder => "/home/deliveryorder",
            Route::Files => "/home/files",
            Route::Users => "/home/admin",
            Route::GroupPermissions => "/home/admin/groupPermission",
            Route::Permissions => "/home/admin/getListPermissions",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Dashboard => "Dashboard",
            Route::ProjectManagement => "Project management",
            Route::Tracking => "Tracking",
            Route::DeliveryOrder => "Delivery orders",
            Route::Files => "Files",
            Route::Users => "Users",
            Route::GroupPermissions => "Group permissions",
            Route::Permissions => "Permissions",
        }
    }

    /// Everything under `/home` requires a valid session
    pub fn is_protected(self) -> bool {
        self != Route::Login
    }

    /// Routes that exist in navigation but have no screen behind them yet
    pub fn is_placeholder(self) -> bool {
        matches!(
            self,
            Route::Dashboard
                | Route::ProjectManagement
                | Route::Tracking
                | Route::DeliveryOrder
                | Route::Files
        )
    }

    /// The list screen rendered at this route, if any
    pub fn screen(self) -> Option<&'static ScreenSpec> {
        screens::for_route(self)
    }

    /// Query fields this route reads as booleans
    pub fn flag_fields(self) -> &'static [&'static str] {
        self.screen().map_or(&[], |s| s.flag_fields)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// A route plus its persisted query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub route: Route,
    pub query: Query,
}

impl Location {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            query: Query::new(),
        }
    }

    pub fn with_query(route: Route, query: Query) -> Self {
        Self { route, query }
    }

    /// Parse `/home/admin?search=bob`. Full URLs are accepted and their
    /// scheme and host ignored.
    pub fn parse(input: &str) -> Result<Location> {
        let input = input.trim();
        let rest = match input.find("://") {
            Some(pos) => {
                let after_scheme = &input[pos + 3..];
                match after_scheme.find(['/', '?']) {
                    Some(idx) => &after_scheme[idx..],
                    None => "/",
                }
            }
            None => input,
        };

        let (path, query_string) = match rest.split_once('?') {
            Some((p, q)) => (p, q),
            None => (rest, ""),
        };
        let path = path.split('#').next().unwrap_or(path);
        let query_string = query_string.split('#').next().unwrap_or(query_string);

        let route = Route::from_path(if path.is_empty() { "/" } else { path }).ok_or_else(|| {
            DeskError::InvalidLocation(input.to_string(), format!("unknown path '{path}'"))
        })?;

        Ok(Location {
            route,
            query: Query::parse(query_string, route.flag_fields()),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.query.is_empty() {
            write!(f, "{}", self.route.path())
        } else {
            write!(f, "{}?{}", self.route.path(), self.query)
        }
    }
}

impl FromStr for Location {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        Location::parse(s)
    }
}

/// Read and write access to the current location
pub trait Navigator: Send {
    fn location(&self) -> &Location;

    /// Move to a new location, keeping the current one in history
    fn push(&mut self, location: Location);

    /// Replace the query of the current location in place
    fn replace_query(&mut self, query: Query);
}

/// In-process navigator with a history stack
#[derive(Debug, Clone)]
pub struct MemoryNavigator {
    history: Vec<Location>,
    writes: usize,
}

impl MemoryNavigator {
    pub fn new(initial: Location) -> Self {
        Self {
            history: vec![initial],
            writes: 0,
        }
    }

    /// Return to the previous location. The first entry is never popped.
    pub fn back(&mut self) -> bool {
        if self.history.len() > 1 {
            self.history.pop();
            true
        } else {
            false
        }
    }

    /// Number of `push` and `replace_query` calls so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn history(&self) -> &[Location] {
        &self.history
    }
}

impl Navigator for MemoryNavigator {
    fn location(&self) -> &Location {
        // history always holds the initial entry
        &self.history[self.history.len() - 1]
    }

    fn push(&mut self, location: Location) {
        self.writes += 1;
        self.history.push(location);
    }

    fn replace_query(&mut self, query: Query) {
        self.writes += 1;
        let last = self.history.len() - 1;
        self.history[last].query = query;
    }
}

/// Resolve where a request for `route` actually lands.
///
/// Protected routes redirect to the sign-in screen unless the session is still
/// valid at `now`; the sign-in screen redirects to the dashboard when it is.
pub fn guard(route: Route, session: Option<&Session>, now: Timestamp) -> Route {
    let signed_in = session.is_some_and(|s| s.is_valid_at(now));
    match (route.is_protected(), signed_in) {
        (true, false) => Route::Login,
        (false, true) => Route::Dashboard,
        _ => route,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FieldValue;
    use jiff::ToSpan;

    #[test]
    fn test_every_route_round_trips() {
        for route in Route::ALL {
            let loc = Location::new(route);
            assert_eq!(Location::parse(&loc.to_string()).unwrap(), loc);
        }
    }

    #[test]
    fn test_parse_with_query() {
        let loc = Location::parse("/home/admin?search=bob&filterActive=false").unwrap();
        assert_eq!(loc.route, Route::Users);
        assert_eq!(loc.query.text("search"), "bob");
        assert_eq!(loc.query.flag("filterActive"), Some(false));
        assert_eq!(loc.to_string(), "/home/admin?filterActive=false&search=bob");
    }

    #[test]
    fn test_parse_full_url_and_trailing_slash() {
        let loc = Location::parse("http://localhost:5173/home/admin/getListPermissions/?resource=user")
            .unwrap();
        assert_eq!(loc.route, Route::Permissions);
        assert_eq!(loc.query.get("resource"), Some(&FieldValue::from("user")));

        assert_eq!(Location::parse("https://desk.example").unwrap().route, Route::Login);
    }

    #[test]
    fn test_parse_unknown_path() {
        let err = Location::parse("/home/nowhere").unwrap_err();
        assert!(matches!(err, DeskError::InvalidLocation(_, _)));
    }

    #[test]
    fn test_memory_navigator() {
        let mut nav = MemoryNavigator::new(Location::new(Route::Dashboard));
        nav.push(Location::new(Route::Users));
        nav.replace_query(Query::new().with("search", "al"));
        assert_eq!(nav.location().to_string(), "/home/admin?search=al");
        assert_eq!(nav.writes(), 2);

        assert!(nav.back());
        assert_eq!(nav.location().route, Route::Dashboard);
        assert!(!nav.back());
    }

    #[test]
    fn test_guard() {
        let now = Timestamp::from_second(1_700_000_000).unwrap();
        let valid = Session::new("tok", now + 1.hour(), "admin", true);
        let expired = Session::new("tok", now - 1.second(), "admin", true);

        assert_eq!(guard(Route::Users, None, now), Route::Login);
        assert_eq!(guard(Route::Users, Some(&expired), now), Route::Login);
        assert_eq!(guard(Route::Users, Some(&valid), now), Route::Users);
        assert_eq!(guard(Route::Login, Some(&valid), now), Route::Dashboard);
        assert_eq!(guard(Route::Login, None, now), Route::Login);
    }
}
