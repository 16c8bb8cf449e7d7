//! Wire types exchanged with the backend auth endpoints

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful `POST /auth/login` response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub username: String,
}

/// Successful `GET /auth/status` response
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub username: String,
    #[serde(default)]
    pub shop_name: Option<String>,
}

/// Error body returned by the backend, e.g. `{"error": "Invalid credentials"}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Locally held user state for the current session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub shop_name: Option<String>,
}

impl From<LoginResponse> for UserProfile {
    fn from(response: LoginResponse) -> Self {
        Self {
            username: response.username,
            shop_name: None,
        }
    }
}

impl From<StatusResponse> for UserProfile {
    fn from(response: StatusResponse) -> Self {
        Self {
            username: response.username,
            shop_name: response.shop_name,
        }
    }
}
