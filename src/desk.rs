//! Signed-in context shared by the commands and the interactive console.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{DeskError, Result};
use crate::forms::{Mutation, MutationFailure, map_mutation_error};
use crate::notify::{Notification, Notifier};
use crate::pagination::{ListSource, Page, PageCache};
use crate::query::Query;
use crate::session::{Session, SessionStore};

pub struct Desk {
    pub config: Config,
    pub sessions: SessionStore,
    pub session: Arc<Session>,
    pub client: Arc<ApiClient>,
    pub cache: Arc<PageCache>,
}

impl Desk {
    /// Load config and session and build an authenticated client. Fails when
    /// nobody is signed in or the session has expired.
    pub fn connect() -> Result<Self> {
        let config = Config::load()?;
        let sessions = SessionStore::open()?;
        let session = sessions.require_valid(Timestamp::now())?;
        let client = ApiClient::from_config(&config, Some(&session))?;
        let cache = PageCache::new(config.cache_ttl());

        Ok(Self {
            config,
            sessions,
            session,
            client: Arc::new(client),
            cache: Arc::new(cache),
        })
    }

    /// Drop the stored session when the server rejects the token
    pub fn check_unauthorized(&self, error: &DeskError) {
        if let DeskError::Api(api) = error
            && api.is_unauthorized()
        {
            warn!("server rejected the access token; signing out");
            if let Err(e) = self.sessions.invalidate() {
                warn!(error = %e, "failed to remove session file");
            }
        }
    }

    /// Report the outcome of a mutation.
    ///
    /// Success notifies, drops the cached pages of every affected list and
    /// returns `Ok`. Failure returns what to show: field messages when the
    /// server named the fields, otherwise a single message.
    pub fn finish(
        &self,
        mutation: Mutation,
        result: Result<()>,
        notifier: &dyn Notifier,
    ) -> std::result::Result<(), MutationFailure> {
        match result {
            Ok(()) => {
                for prefix in mutation.invalidates() {
                    let dropped = self.cache.invalidate_prefix(prefix);
                    info!(resource = prefix, dropped, "invalidated cached pages");
                }
                notifier.notify(Notification::success(mutation.success_message()));
                Ok(())
            }
            Err(error) => {
                warn!(?mutation, error = %error, "mutation failed");
                self.check_unauthorized(&error);
                Err(map_mutation_error(mutation, &error))
            }
        }
    }
}

/// List source that signs out when the server rejects the token
pub struct GuardedSource<T> {
    inner: Arc<dyn ListSource<T>>,
    desk: Arc<Desk>,
}

impl<T> GuardedSource<T> {
    pub fn new(inner: Arc<dyn ListSource<T>>, desk: Arc<Desk>) -> Self {
        Self { inner, desk }
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> ListSource<T> for GuardedSource<T> {
    fn resource(&self) -> &str {
        self.inner.resource()
    }

    async fn fetch_page(&self, query: &Query, page: u32, page_size: u32) -> Result<Page<T>> {
        let result = self.inner.fetch_page(query, page, page_size).await;
        if let Err(e) = &result {
            self.desk.check_unauthorized(e);
        }
        result
    }

    fn invalidate(&self) {
        self.inner.invalidate();
    }
}
