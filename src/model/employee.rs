use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Staff member row. `password` and `pin` hold argon2 hashes and are never
/// serialized out.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 3,
        "first_name": "Maya",
        "last_name": "Rahman",
        "username": "maya.r",
        "role_id": 3,
        "email": "maya@restaurant.example",
        "phone": "+447700900123",
        "joining_date": "2024-01-15",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 3)]
    pub id: u64,

    #[schema(example = "Maya")]
    pub first_name: String,

    #[schema(example = "Rahman")]
    pub last_name: String,

    #[schema(example = "maya.r")]
    pub username: String,

    #[serde(skip_serializing)]
    #[schema(write_only)]
    pub password: String,

    /// Argon2 hash of the clock-in PIN; absent until a PIN is assigned.
    #[serde(skip_serializing)]
    #[schema(write_only, nullable = true)]
    pub pin: Option<String>,

    #[schema(example = 3)]
    pub role_id: u8,

    #[schema(example = "maya@restaurant.example", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "+447700900123", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub joining_date: NaiveDate,

    #[schema(example = "active")]
    pub status: String,
}
