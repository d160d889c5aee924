//! Wire types for the clinic authentication API
//!
//! The backend has shipped two response shapes for token grants: a nested
//! `{"tokens": {...}}` object and flat `accessToken`/`refreshToken` fields
//! at the top level. Both decode into [`AuthResponse`].

use chrono::{DateTime, Utc};
use clinic_core::{Role, SessionTokens, User};
use serde::{Deserialize, Deserializer, Serialize};

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Token refresh request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Logout request; the refresh token lets the server revoke the pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Password reset request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Password reset acknowledgement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgotPasswordResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// User as returned by the API, before normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_role() -> String {
    "user".to_string()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        let display_name = dto
            .display_name
            .or(dto.name)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| {
                dto.email
                    .split('@')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            });

        Self {
            id: dto.id,
            email: dto.email.trim().to_string(),
            role: Role::parse(&dto.role),
            display_name,
        }
    }
}

/// Access/refresh token grant with an optional lifetime in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    /// Convert to a token pair, anchoring the lifetime at `now`
    pub fn into_session_tokens(self, now: DateTime<Utc>) -> SessionTokens {
        SessionTokens::from_grant(self.access_token, self.refresh_token, self.expires_in, now)
    }
}

/// Response of login, registration and refresh
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawAuthResponse")]
pub struct AuthResponse {
    /// Absent on some refresh responses
    pub user: Option<UserDto>,
    pub tokens: TokenGrant,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAuthResponse {
    #[serde(default)]
    user: Option<UserDto>,
    #[serde(default)]
    tokens: Option<TokenGrant>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

impl TryFrom<RawAuthResponse> for AuthResponse {
    type Error = String;

    fn try_from(raw: RawAuthResponse) -> Result<Self, Self::Error> {
        let tokens = match (raw.tokens, raw.access_token, raw.refresh_token) {
            (Some(tokens), _, _) => tokens,
            (None, Some(access_token), Some(refresh_token)) => TokenGrant {
                access_token,
                refresh_token,
                expires_in: raw.expires_in,
            },
            _ => return Err("response carries no access/refresh token pair".to_string()),
        };

        Ok(Self {
            user: raw.user,
            tokens,
        })
    }
}

/// Response of `GET /auth/me`: either `{"user": {...}}` or a bare user
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MeResponse {
    Wrapped { user: UserDto },
    Bare(UserDto),
}

impl MeResponse {
    pub fn into_user(self) -> UserDto {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_token_shape() {
        let response: AuthResponse = serde_json::from_value(json!({
            "user": {"id": "u1", "email": "a@clinic.test", "role": "Admin"},
            "tokens": {"accessToken": "acc", "refreshToken": "ref", "expiresIn": 900}
        }))
        .unwrap();

        assert_eq!(response.tokens.access_token, "acc");
        assert_eq!(response.tokens.expires_in, Some(900));
        assert_eq!(response.user.unwrap().role, "Admin");
    }

    #[test]
    fn test_flat_token_shape() {
        let response: AuthResponse = serde_json::from_value(json!({
            "user": {"id": 42, "email": "b@clinic.test", "role": "user"},
            "accessToken": "acc",
            "refreshToken": "ref"
        }))
        .unwrap();

        assert_eq!(response.tokens.refresh_token, "ref");
        assert_eq!(response.tokens.expires_in, None);
        assert_eq!(response.user.unwrap().id, "42");
    }

    #[test]
    fn test_missing_tokens_is_an_error() {
        let result: Result<AuthResponse, _> = serde_json::from_value(json!({
            "user": {"id": "u1", "email": "a@clinic.test"},
            "accessToken": "acc"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_me_response_shapes() {
        let wrapped: MeResponse = serde_json::from_value(json!({
            "user": {"id": "u1", "email": "a@clinic.test", "role": "ADMIN"}
        }))
        .unwrap();
        assert_eq!(wrapped.into_user().id, "u1");

        let bare: MeResponse =
            serde_json::from_value(json!({"id": "u2", "email": "c@clinic.test"})).unwrap();
        let user = bare.into_user();
        assert_eq!(user.id, "u2");
        assert_eq!(user.role, "user");
    }

    #[test]
    fn test_user_normalization() {
        let dto = UserDto {
            id: "7".into(),
            email: "dr.house@clinic.test".into(),
            role: "Admin".into(),
            name: None,
            display_name: Some("  ".into()),
        };
        let user = User::from(dto);
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.display_name, "dr.house");

        let dto = UserDto {
            id: "8".into(),
            email: "n@clinic.test".into(),
            role: "User".into(),
            name: Some("Nurse Joy".into()),
            display_name: None,
        };
        assert_eq!(User::from(dto).display_name, "Nurse Joy");
    }

    #[test]
    fn test_refresh_request_is_camel_case() {
        let body = serde_json::to_value(RefreshRequest {
            refresh_token: "ref".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"refreshToken": "ref"}));
    }
}
