//! Filter-state synchronization for list screens.
//!
//! Three copies of the filters exist:
//! - local: what the inputs show, updated on every keystroke
//! - debounced: the whole local set, released once typing pauses
//! - persisted: the query of the current [`Location`](crate::router::Location)
//!
//! Only the persisted copy is read when deciding what to fetch. A settled
//! snapshot is written back in a single `replace_query` call that covers every
//! field that changed during the window.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::debounce::Debouncer;
use crate::query::{FieldValue, Query};
use crate::router::Navigator;

pub struct FilterSync {
    debounced_fields: &'static [&'static str],
    local: Query,
    debouncer: Debouncer<Query>,
}

impl FilterSync {
    /// Create a synchronizer seeded from the persisted location.
    ///
    /// Settled snapshots arrive on the returned receiver and must be passed
    /// back to [`FilterSync::settle`].
    pub fn new(
        debounced_fields: &'static [&'static str],
        delay: Duration,
        nav: &dyn Navigator,
    ) -> (Self, mpsc::UnboundedReceiver<Query>) {
        let (debouncer, rx) = Debouncer::channel(delay);
        let mut sync = Self {
            debounced_fields,
            local: Query::new(),
            debouncer,
        };
        sync.hydrate(nav);
        (sync, rx)
    }

    /// Current input values for the debounced fields
    pub fn local(&self) -> &Query {
        &self.local
    }

    pub fn is_debounced(&self, field: &str) -> bool {
        self.debounced_fields.contains(&field)
    }

    /// Record a keystroke. The input reflects it at once; the persisted query
    /// only after the debounce window.
    pub fn edit(&mut self, field: &str, value: Option<FieldValue>) {
        self.local.set(field, value);
        self.debouncer.push(self.local.project(self.debounced_fields));
    }

    /// Write a settled snapshot to the navigator.
    ///
    /// Returns true when the persisted query was replaced.
    pub fn settle(&mut self, snapshot: &Query, nav: &mut dyn Navigator) -> bool {
        let persisted = nav.location().query.clone();
        let changes = persisted.changes_to(snapshot, self.debounced_fields);
        if changes.is_empty() {
            return false;
        }

        let mut next = persisted;
        for (field, value) in changes {
            next.set(&field, value);
        }
        debug!(query = %next, "filters settled");
        nav.replace_query(next);
        true
    }

    /// Write a non-debounced control (dropdown, toggle) straight through
    pub fn set_direct(
        &mut self,
        field: &str,
        value: Option<FieldValue>,
        nav: &mut dyn Navigator,
    ) -> bool {
        let mut next = nav.location().query.clone();
        if !next.set(field, value) {
            return false;
        }
        nav.replace_query(next);
        true
    }

    /// The canonical query as read back from the navigator
    pub fn persisted(nav: &dyn Navigator) -> Query {
        nav.location().query.clone()
    }

    /// Reset local inputs from the persisted location, dropping any pending
    /// snapshot. Used on construction and after external navigation.
    pub fn hydrate(&mut self, nav: &dyn Navigator) {
        self.debouncer.cancel();
        self.local = nav.location().query.project(self.debounced_fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{Location, MemoryNavigator, Route};

    const FIELDS: &[&str] = &["name", "description", "endpoint", "method"];

    fn nav_at(qs: &str) -> MemoryNavigator {
        MemoryNavigator::new(Location::parse(&format!("/home/admin/getListPermissions?{qs}")).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_fields_in_one_window_produce_one_write() {
        let mut nav = nav_at("resource=user");
        let (mut sync, mut rx) = FilterSync::new(FIELDS, Duration::from_millis(500), &nav);

        for partial in ["r", "re", "rea", "read"] {
            sync.edit("name", Some(partial.into()));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        sync.edit("description", Some("can read".into()));
        assert_eq!(sync.local().text("name"), "read");

        let snapshot = rx.recv().await.unwrap();
        assert!(sync.settle(&snapshot, &mut nav));
        assert_eq!(nav.writes(), 1);
        assert_eq!(
            nav.location().to_string(),
            "/home/admin/getListPermissions?description=can+read&name=read&resource=user"
        );

        // Nothing further is scheduled
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_a_field_removes_it() {
        let mut nav = nav_at("name=read&method=GET");
        let (mut sync, mut rx) = FilterSync::new(FIELDS, Duration::from_millis(10), &nav);
        assert_eq!(sync.local().text("name"), "read");

        sync.edit("name", Some("".into()));
        let snapshot = rx.recv().await.unwrap();
        assert!(sync.settle(&snapshot, &mut nav));
        assert!(!nav.location().query.contains("name"));
        assert!(!nav.location().to_string().contains("name="));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_without_changes_does_not_write() {
        let mut nav = nav_at("name=read");
        let (mut sync, mut rx) = FilterSync::new(FIELDS, Duration::from_millis(10), &nav);

        sync.edit("name", Some("rea".into()));
        sync.edit("name", Some("read".into()));
        let snapshot = rx.recv().await.unwrap();
        assert!(!sync.settle(&snapshot, &mut nav));
        assert_eq!(nav.writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_direct_writes_immediately() {
        let mut nav = nav_at("");
        let (mut sync, _rx) = FilterSync::new(FIELDS, Duration::from_millis(500), &nav);

        assert!(sync.set_direct("resource", Some("group".into()), &mut nav));
        assert_eq!(FilterSync::persisted(&nav).text("resource"), "group");
        assert!(!sync.set_direct("resource", Some("group".into()), &mut nav));
        assert_eq!(nav.writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hydrate_drops_pending_edit() {
        let mut nav = nav_at("");
        let (mut sync, mut rx) = FilterSync::new(FIELDS, Duration::from_millis(100), &nav);
        sync.edit("name", Some("draft".into()));

        nav.push(Location::parse("/home/admin/getListPermissions?name=shared").unwrap());
        sync.hydrate(&nav);
        assert_eq!(sync.local().text("name"), "shared");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(nav.location().route, Route::Permissions);
    }
}
