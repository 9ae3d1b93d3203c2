//! Display rows for the list screens.
//!
//! The console renders every list the same way, so each record type is
//! flattened into a [`Row`] and the controller runs over rows.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{Group, Permission, User};
use crate::error::Result;
use crate::pagination::{ListSource, Page};
use crate::query::Query;
use crate::screens::ScreenId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: i64,
    pub cells: Vec<String>,
}

pub trait TableRow {
    fn to_row(&self) -> Row;
}

impl TableRow for User {
    fn to_row(&self) -> Row {
        Row {
            id: self.id,
            cells: vec![
                self.user_name.clone(),
                self.full_name.clone(),
                active_label(self.is_active).to_string(),
                if self.is_superuser { "superuser" } else { "" }.to_string(),
            ],
        }
    }
}

impl TableRow for Permission {
    fn to_row(&self) -> Row {
        Row {
            id: self.id,
            cells: vec![
                self.name.clone(),
                self.resource.clone(),
                self.action.clone(),
                self.method.clone().unwrap_or_default(),
                self.endpoint.clone().unwrap_or_default(),
            ],
        }
    }
}

impl TableRow for Group {
    fn to_row(&self) -> Row {
        Row {
            id: self.id,
            cells: vec![
                self.name.clone(),
                self.description.clone().unwrap_or_default(),
                format!("{} permissions", self.permissions.len()),
            ],
        }
    }
}

fn active_label(active: bool) -> &'static str {
    if active { "active" } else { "inactive" }
}

/// Column headers and widths for a screen
pub fn columns(screen: ScreenId) -> &'static [(&'static str, usize)] {
    match screen {
        ScreenId::Users => &[("User name", 20), ("Full name", 28), ("Status", 10), ("", 10)],
        ScreenId::Permissions => &[
            ("Name", 24),
            ("Resource", 12),
            ("Action", 8),
            ("Method", 7),
            ("Endpoint", 30),
        ],
        ScreenId::Groups => &[("Name", 24), ("Description", 36), ("", 16)],
    }
}

/// Adapts a typed source into a row source
pub struct RowSource<T> {
    inner: Arc<dyn ListSource<T>>,
}

impl<T> RowSource<T> {
    pub fn new(inner: Arc<dyn ListSource<T>>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: TableRow + Send + Sync + 'static> ListSource<Row> for RowSource<T> {
    fn resource(&self) -> &str {
        self.inner.resource()
    }

    async fn fetch_page(&self, query: &Query, page: u32, page_size: u32) -> Result<Page<Row>> {
        let page = self.inner.fetch_page(query, page, page_size).await?;
        Ok(page.map(|item| item.to_row()))
    }

    fn invalidate(&self) {
        self.inner.invalidate();
    }
}
