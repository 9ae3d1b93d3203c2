use reqwest::Method;
use serde_json::json;

use crate::api::ApiClient;
use crate::api::types::LoginResponse;
use crate::error::Result;
use crate::session::{Session, parse_expiration};

impl ApiClient {
    /// `POST /login`
    pub async fn login(&self, user_name: &str, password: &str) -> Result<LoginResponse> {
        let builder = self
            .request(Method::POST, "login")?
            .json(&json!({ "user_name": user_name, "password": password }));
        self.send_json(builder).await
    }
}

impl LoginResponse {
    /// Turn a successful sign-in into a session
    pub fn into_session(self) -> Result<Session> {
        let expiration = parse_expiration(&self.expiration)?;
        let mut session = Session::new(
            self.access_token,
            expiration,
            self.user_info.user_name,
            self.user_info.is_superuser,
        );
        if let Some(token) = self.refresh_token {
            let refresh_expiration = self
                .expiration_refresh_token
                .as_deref()
                .map(parse_expiration)
                .transpose()?;
            session = session.with_refresh(token, refresh_expiration);
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_session() {
        let body = r#"{
            "access_token": "tok",
            "expiration": "2030-01-01T00:00:00",
            "refresh_token": "ref",
            "expiration_refresh_token": "2030-02-01T00:00:00Z",
            "user_info": {"user_name": "admin", "is_superuser": true}
        }"#;
        let response: LoginResponse = serde_json::from_str(body).unwrap();
        let session = response.into_session().unwrap();
        assert_eq!(session.user_name(), "admin");
        assert_eq!(session.access_token(), "tok");
        assert!(session.has_refresh_token());
        assert_eq!(
            session.expiration(),
            "2030-01-01T00:00:00Z".parse::<jiff::Timestamp>().unwrap()
        );
    }

    #[test]
    fn test_into_session_rejects_bad_expiration() {
        let body = r#"{"access_token":"t","expiration":"soon","user_info":{"user_name":"a"}}"#;
        let response: LoginResponse = serde_json::from_str(body).unwrap();
        assert!(response.into_session().is_err());
    }
}
