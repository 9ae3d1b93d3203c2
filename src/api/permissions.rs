use reqwest::Method;

use crate::api::ApiClient;
use crate::api::types::{Permission, PermissionInput};
use crate::error::Result;
use crate::pagination::{ListResponse, Page};

impl ApiClient {
    /// `GET /permissions` filtered by any of resource, action, name,
    /// description, endpoint and method
    pub async fn list_permissions(&self, filters: &[(&str, String)]) -> Result<Page<Permission>> {
        let builder = self.request(Method::GET, "permissions")?.query(filters);
        let response: ListResponse<Permission> = self.send_json(builder).await?;
        Ok(response.into())
    }

    /// `POST /permissions?…`
    pub async fn create_permission(&self, input: &PermissionInput) -> Result<()> {
        let builder = self
            .request(Method::POST, "permissions")?
            .query(&input.params());
        self.send_unit(builder).await
    }

    pub async fn delete_permission(&self, id: i64) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("permissions/{id}"))?;
        self.send_unit(builder).await
    }
}
