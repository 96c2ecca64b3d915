use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "maya.r")]
    pub username: String,
    #[schema(example = "hunter2")]
    pub password: String,
}

/// Credential columns loaded at login.
#[derive(FromRow)]
pub struct CredentialRow {
    pub id: u64,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub employee_id: u64,
    pub sub: String,
    pub role: u8,
    pub exp: usize,
    pub jti: String,
    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
