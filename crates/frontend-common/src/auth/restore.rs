//! Session restore at application start
//!
//! The only path from the initial "unknown" state to logged-in or
//! logged-out after a reload.

use super::context::{AuthAction, SessionStore};
use super::token_store::TokenStore;
use crate::services::auth::AuthApiService;
use clinic_core::{SessionTokens, TokenExpiry, User};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    LoggedIn(User),
    LoggedOut,
    /// The caller went away before `/auth/me` answered; the session stays pending
    Cancelled,
}

/// Rehydrate the session from the token store
///
/// Without a valid stored token no request is made. With one, the current
/// user is fetched; on failure the stored tokens are discarded.
pub async fn restore_session(
    tokens: &TokenStore,
    session: &SessionStore,
    api: &AuthApiService,
    cancel: &CancellationToken,
) -> RestoreOutcome {
    let access_token = match tokens.access_token() {
        Some(token) if tokens.has_valid_auth() => token,
        _ => {
            debug!("No valid stored session");
            tokens.clear();
            session.dispatch(AuthAction::ClearAuth);
            return RestoreOutcome::LoggedOut;
        }
    };

    // Guards wait while the stored token is checked, also on a second restore.
    session.dispatch(AuthAction::SetLoading(true));

    let fetched = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("Session restore cancelled");
            return RestoreOutcome::Cancelled;
        }
        result = api.me(&access_token) => result,
    };

    match fetched {
        Ok(user) => {
            if let Some(refresh_token) = tokens.refresh_token() {
                // Real expiry stays with the token store.
                session.dispatch(AuthAction::SetTokens(SessionTokens::new(
                    access_token,
                    refresh_token,
                    TokenExpiry::Unknown,
                )));
            }
            session.dispatch(AuthAction::SetUser(user.clone()));
            info!(user_id = %user.id, role = %user.role, "Session restored");
            RestoreOutcome::LoggedIn(user)
        }
        Err(err) => {
            warn!(error = %err, "Stored session rejected");
            tokens.clear();
            session.dispatch(AuthAction::ClearAuth);
            RestoreOutcome::LoggedOut
        }
    }
}
