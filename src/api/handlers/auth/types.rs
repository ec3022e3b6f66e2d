//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub token: String,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountResponse {
    pub email: String,
    pub email_verified: bool,
}

#[derive(Deserialize, Debug)]
pub struct ValidateTokenQuery {
    pub token: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetRequestQuery {
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct ResetPasswordQuery {
    #[serde(rename = "newPassword")]
    pub new_password: String,
    pub token: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn credentials_request_round_trips() -> Result<()> {
        let request = CredentialsRequest {
            email: "alice@example.com".to_string(),
            password: "pw".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let email = value
            .get("email")
            .and_then(serde_json::Value::as_str)
            .context("missing email")?;
        assert_eq!(email, "alice@example.com");
        let decoded: CredentialsRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.password, "pw");
        Ok(())
    }

    #[test]
    fn reset_password_query_uses_camel_case_key() -> Result<()> {
        let decoded: ResetPasswordQuery = serde_json::from_value(serde_json::json!({
            "newPassword": "next",
            "token": "12345",
            "email": "alice@example.com",
        }))?;
        assert_eq!(decoded.new_password, "next");
        assert_eq!(decoded.token, "12345");
        Ok(())
    }
}
