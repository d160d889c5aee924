use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of an authenticated user.
///
/// Roles arrive from the API in whatever casing the backend chose; the
/// canonical form is always lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    User,
    Other(String),
}

impl Role {
    /// Parse a role name, ignoring case and surrounding whitespace
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "admin" => Self::Admin,
            "user" => Self::User,
            _ => Self::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user as the application sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub display_name: String,
}

impl User {
    /// Check whether the user holds one of the given roles
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

/// Expiry of an access token.
///
/// `Unknown` marks copies of the token pair whose real expiry lives
/// elsewhere (the session mirror after a page reload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenExpiry {
    At(DateTime<Utc>),
    Unknown,
}

impl TokenExpiry {
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(at) => Some(*at),
            Self::Unknown => None,
        }
    }
}

/// Access/refresh token pair
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: TokenExpiry,
}

impl SessionTokens {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: TokenExpiry,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    /// Build a token pair from a grant that carries a lifetime in seconds
    pub fn from_grant(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: Option<i64>,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = expires_in
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .map_or(TokenExpiry::Unknown, TokenExpiry::At);
        Self::new(access_token, refresh_token, expires_at)
    }
}

// Tokens are credentials; keep them out of logs.
impl fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_is_case_insensitive() {
        assert_eq!(Role::parse("Admin"), Role::Admin);
        assert_eq!(Role::parse(" USER "), Role::User);
        assert_eq!(Role::parse("Receptionist"), Role::Other("receptionist".into()));
        assert_eq!(Role::parse("Receptionist").as_str(), "receptionist");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
        let role: Role = serde_json::from_str("\"DOCTOR\"").unwrap();
        assert_eq!(role, Role::Other("doctor".into()));
    }

    #[test]
    fn test_from_grant_computes_expiry() {
        let now = Utc::now();
        let tokens = SessionTokens::from_grant("a", "r", Some(900), now);
        assert_eq!(
            tokens.expires_at,
            TokenExpiry::At(now + Duration::try_seconds(900).unwrap())
        );

        let tokens = SessionTokens::from_grant("a", "r", None, now);
        assert_eq!(tokens.expires_at, TokenExpiry::Unknown);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let tokens = SessionTokens::new("secret-access", "secret-refresh", TokenExpiry::Unknown);
        let rendered = format!("{tokens:?}");
        assert!(!rendered.contains("secret"));
    }
}
