//! List sources backed by the REST endpoints.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::api::types::{Group, Permission, User};
use crate::error::Result;
use crate::pagination::{ListSource, Page};
use crate::query::Query;
use crate::screens::{self, ScreenSpec};

/// Feeds one screen's list from its endpoint
pub struct EndpointSource<T> {
    client: Arc<ApiClient>,
    screen: &'static ScreenSpec,
    _item: PhantomData<fn() -> T>,
}

impl<T> EndpointSource<T> {
    pub fn new(client: Arc<ApiClient>, screen: &'static ScreenSpec) -> Self {
        Self {
            client,
            screen,
            _item: PhantomData,
        }
    }

    /// Unpaginated endpoints deliver everything with page 1
    fn beyond_single_page(&self, page: u32) -> bool {
        !self.screen.paginated && page > 1
    }
}

impl EndpointSource<User> {
    pub fn users(client: Arc<ApiClient>) -> Self {
        Self::new(client, &screens::USERS)
    }
}

impl EndpointSource<Permission> {
    pub fn permissions(client: Arc<ApiClient>) -> Self {
        Self::new(client, &screens::PERMISSIONS)
    }
}

impl EndpointSource<Group> {
    pub fn groups(client: Arc<ApiClient>) -> Self {
        Self::new(client, &screens::GROUPS)
    }
}

#[async_trait]
impl ListSource<User> for EndpointSource<User> {
    fn resource(&self) -> &str {
        self.screen.resource
    }

    async fn fetch_page(&self, query: &Query, page: u32, page_size: u32) -> Result<Page<User>> {
        let params = self.screen.request_params(query);
        self.client.list_users(page, page_size, &params).await
    }
}

#[async_trait]
impl ListSource<Permission> for EndpointSource<Permission> {
    fn resource(&self) -> &str {
        self.screen.resource
    }

    async fn fetch_page(&self, query: &Query, page: u32, _page_size: u32) -> Result<Page<Permission>> {
        if self.beyond_single_page(page) {
            return Ok(Page::single(Vec::new()));
        }
        let params = self.screen.request_params(query);
        self.client.list_permissions(&params).await
    }
}

#[async_trait]
impl ListSource<Group> for EndpointSource<Group> {
    fn resource(&self) -> &str {
        self.screen.resource
    }

    async fn fetch_page(&self, _query: &Query, page: u32, _page_size: u32) -> Result<Page<Group>> {
        if self.beyond_single_page(page) {
            return Ok(Page::single(Vec::new()));
        }
        Ok(Page::single(self.client.active_groups().await?))
    }
}
