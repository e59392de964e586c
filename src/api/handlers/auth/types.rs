//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::principal::Identity;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    /// Company email or bare username; emails are reduced to their local part.
    pub identifier: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub utente: Identity,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub id_dipendente: i32,
    /// Defaults to the email local part when omitted.
    pub username: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn login_request_round_trips() -> Result<()> {
        let request = LoginRequest {
            identifier: "mario.rossi@company.com".to_string(),
            password: "segretissima".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let identifier = value
            .get("identifier")
            .and_then(serde_json::Value::as_str)
            .context("missing identifier")?;
        assert_eq!(identifier, "mario.rossi@company.com");
        let decoded: LoginRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.password, "segretissima");
        Ok(())
    }

    #[test]
    fn register_request_username_is_optional() -> Result<()> {
        let decoded: RegisterRequest = serde_json::from_value(serde_json::json!({
            "email": "anna.bianchi@company.com",
            "password": "passw0rd!",
            "id_dipendente": 3,
        }))?;
        assert_eq!(decoded.username, None);
        Ok(())
    }
}
