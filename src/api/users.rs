use reqwest::Method;

use crate::api::ApiClient;
use crate::api::types::{User, UserInput, UserPermission};
use crate::error::Result;
use crate::pagination::{ListResponse, Page};

impl ApiClient {
    /// `GET /user` with paging and filter parameters
    pub async fn list_users(
        &self,
        page: u32,
        page_size: u32,
        filters: &[(&str, String)],
    ) -> Result<Page<User>> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
        ];
        params.extend(filters.iter().cloned());
        let builder = self.request(Method::GET, "user")?.query(&params);
        let response: ListResponse<User> = self.send_json(builder).await?;
        Ok(response.into())
    }

    /// `POST /user?…` with the initial group ids as body
    pub async fn create_user(&self, input: &UserInput, group_ids: &[i64]) -> Result<()> {
        let builder = self
            .request(Method::POST, "user")?
            .query(&input.params())
            .json(group_ids);
        self.send_unit(builder).await
    }

    /// `PUT /user/{id}?…`
    pub async fn update_user(&self, id: i64, input: &UserInput) -> Result<()> {
        let builder = self
            .request(Method::PUT, &format!("user/{id}"))?
            .query(&input.params());
        self.send_unit(builder).await
    }

    /// `PUT /user/delete/{id}` (soft delete)
    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let builder = self.request(Method::PUT, &format!("user/delete/{id}"))?;
        self.send_unit(builder).await
    }

    /// `GET /user/{id}/permissions`: groups currently attached to a user
    pub async fn user_permissions(&self, id: i64) -> Result<Vec<UserPermission>> {
        let builder = self.request(Method::GET, &format!("user/{id}/permissions"))?;
        self.send_json(builder).await
    }

    /// `POST /user/assign?user_id={id}` replacing the user's groups
    pub async fn assign_groups(&self, id: i64, group_ids: &[i64]) -> Result<()> {
        let builder = self
            .request(Method::POST, "user/assign")?
            .query(&[("user_id", id)])
            .json(group_ids);
        self.send_unit(builder).await
    }
}
