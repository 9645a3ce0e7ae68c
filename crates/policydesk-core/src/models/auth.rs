use serde::{Deserialize, Serialize};

use crate::auth::TokenPair;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    pub id: u64,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub two_fa_enabled: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LoginResponse {
    pub token_pair: TokenPair,
    pub user: User,
    #[serde(default)]
    pub requires_2fa: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TwoFactorSetup {
    pub secret: String,
    pub qr_code_url: String,
}

/// Generic `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_response() {
        let json = r#"{
            "token_pair": {"access_token": "A1", "refresh_token": "R1", "expires_at": 1767225600},
            "user": {"id": 1, "email": "admin@x.com", "role": "admin", "two_fa_enabled": false,
                     "is_active": true, "created_at": "2025-01-01T00:00:00Z"},
            "requires_2fa": false
        }"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("Failed to parse login JSON");
        assert_eq!(resp.token_pair.access_token, "A1");
        assert_eq!(resp.token_pair.refresh_token, "R1");
        assert!(resp.token_pair.expires_at.is_some());
        assert!(resp.user.is_admin());
        assert!(!resp.requires_2fa);
    }
}
