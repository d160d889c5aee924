//! User-friendly error message mappings

use clinic_http::ClientError;

/// Operation whose failure is being reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOperation {
    Login,
    Register,
    ForgotPassword,
}

pub const GENERIC_ERROR: &str = "Something went wrong. Please try again later.";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Convert a client error into a message fit to show the user, or `None`
/// when only the generic message applies.
pub fn user_friendly_error(operation: AuthOperation, error: &ClientError) -> Option<String> {
    let status = error.status()?;
    let message = match (operation, status) {
        (AuthOperation::Login, 400 | 401) => "Invalid email or password.".to_string(),
        (AuthOperation::Register, 409) => "An account with this email already exists.".to_string(),
        (AuthOperation::ForgotPassword, 404) => {
            "No account is registered with this email.".to_string()
        }
        (_, 429) => "Too many attempts. Please wait a moment and try again.".to_string(),
        (_, 400..=499) => error
            .rejection_message()
            .map(str::trim)
            .filter(|message| !message.is_empty() && message.len() <= 200)
            .map_or_else(|| GENERIC_ERROR.to_string(), ToString::to_string),
        _ => return None,
    };
    Some(message)
}
