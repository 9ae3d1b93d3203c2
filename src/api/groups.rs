use reqwest::Method;

use crate::api::ApiClient;
use crate::api::types::{Group, GroupInput};
use crate::error::Result;
use crate::pagination::{ListResponse, Page};

impl ApiClient {
    /// `GET /groups`. The endpoint returns every group in one response.
    pub async fn list_groups(&self) -> Result<Page<Group>> {
        let builder = self.request(Method::GET, "groups")?;
        let response: ListResponse<Group> = self.send_json(builder).await?;
        Ok(response.into())
    }

    /// Groups that can still be assigned
    pub async fn active_groups(&self) -> Result<Vec<Group>> {
        let page = self.list_groups().await?;
        Ok(page.items.into_iter().filter(|g| g.is_active).collect())
    }

    pub async fn get_group(&self, id: i64) -> Result<Group> {
        let builder = self.request(Method::GET, &format!("groups/{id}"))?;
        self.send_json(builder).await
    }

    pub async fn create_group(&self, input: &GroupInput) -> Result<()> {
        let builder = self.request(Method::POST, "groups")?.json(input);
        self.send_unit(builder).await
    }

    pub async fn update_group(&self, id: i64, input: &GroupInput) -> Result<()> {
        let builder = self
            .request(Method::PUT, &format!("groups/{id}"))?
            .json(input);
        self.send_unit(builder).await
    }

    pub async fn delete_group(&self, id: i64) -> Result<()> {
        let builder = self.request(Method::DELETE, &format!("groups/{id}"))?;
        self.send_unit(builder).await
    }
}
