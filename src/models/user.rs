use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// A registered user's profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub health_conditions: Vec<String>,
    pub barangay: Option<String>,
    pub city: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// First word of the display name, used when addressing the user by voice.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("there")
    }
}

/// POST /api/v1/users body.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[garde(email)]
    pub email: String,

    #[garde(length(min = 8, max = 128))]
    pub password: String,

    #[garde(length(min = 1, max = 120))]
    pub name: String,

    #[serde(default)]
    #[garde(length(max = 20), inner(length(min = 1, max = 80)))]
    pub health_conditions: Vec<String>,

    #[garde(length(max = 120))]
    pub barangay: Option<String>,

    #[garde(length(max = 120))]
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: String,
    pub email: String,
}

/// PUT /api/v1/users/{user_id} body. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[garde(length(min = 1, max = 120))]
    pub name: Option<String>,

    #[garde(length(max = 20))]
    pub health_conditions: Option<Vec<String>>,

    #[garde(length(max = 120))]
    pub barangay: Option<String>,

    #[garde(length(max = 120))]
    pub city: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.health_conditions.is_none()
            && self.barangay.is_none()
            && self.city.is_none()
    }
}
