//! Global authentication state and its reducer

use clinic_core::{SessionTokens, User};
use std::sync::Arc;
use tokio::sync::watch;

/// Authentication state as rendered by views
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    /// Read-only mirror of the token store
    pub tokens: Option<SessionTokens>,
    pub is_authenticated: bool,
    /// True until session restore (or a login) has settled the session
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Session mutations
#[derive(Debug, Clone)]
pub enum AuthAction {
    SetUser(User),
    SetTokens(SessionTokens),
    /// Used by logout and by an unrecoverable 401
    ClearAuth,
    SetError(Option<String>),
    SetLoading(bool),
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            tokens: None,
            is_authenticated: false,
            is_loading: true, // Unknown until the stored session has been checked
            error: None,
        }
    }
}

impl SessionState {
    /// Apply an action. Pure; all I/O happens in whoever dispatches.
    #[must_use]
    pub fn reduce(self, action: AuthAction) -> Self {
        match action {
            AuthAction::SetUser(user) => Self {
                user: Some(user),
                is_authenticated: true,
                is_loading: false,
                error: None,
                ..self
            },
            AuthAction::SetTokens(tokens) => Self {
                tokens: Some(tokens),
                ..self
            },
            AuthAction::ClearAuth => Self {
                user: None,
                tokens: None,
                is_authenticated: false,
                is_loading: false,
                ..self
            },
            AuthAction::SetError(error) => Self { error, ..self },
            AuthAction::SetLoading(is_loading) => Self { is_loading, ..self },
        }
    }

    pub fn role(&self) -> Option<&clinic_core::Role> {
        self.user.as_ref().map(|user| &user.role)
    }
}

/// Shared handle to the session state
///
/// Cloning is cheap; every clone observes the same state. Views that need
/// to re-render on change hold a receiver from [`SessionStore::subscribe`].
#[derive(Clone, Debug)]
pub struct SessionStore {
    sender: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(SessionState::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn dispatch(&self, action: AuthAction) {
        self.sender.send_modify(|state| {
            let current = std::mem::take(state);
            *state = current.reduce(action);
        });
    }

    pub fn snapshot(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.sender.borrow().is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.sender.borrow().is_loading
    }

    pub fn user(&self) -> Option<User> {
        self.sender.borrow().user.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.sender
            .borrow()
            .tokens
            .as_ref()
            .map(|tokens| tokens.access_token.clone())
            .filter(|token| !token.is_empty())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.sender
            .borrow()
            .tokens
            .as_ref()
            .map(|tokens| tokens.refresh_token.clone())
            .filter(|token| !token.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinic_core::{Role, TokenExpiry};

    fn user(role: &str) -> User {
        User {
            id: "1".into(),
            email: "pat@clinic.test".into(),
            role: Role::parse(role),
            display_name: "Pat".into(),
        }
    }

    fn tokens() -> SessionTokens {
        SessionTokens::new("acc", "ref", TokenExpiry::Unknown)
    }

    #[test]
    fn test_initial_state_is_loading_and_empty() {
        let state = SessionState::default();
        assert!(state.is_loading);
        assert!(!state.is_authenticated);
        assert!(state.user.is_none());
    }

    #[test]
    fn test_set_user_authenticates() {
        let state = SessionState::default().reduce(AuthAction::SetUser(user("admin")));
        assert!(state.is_authenticated);
        assert!(!state.is_loading);
        assert_eq!(state.role(), Some(&Role::Admin));
    }

    #[test]
    fn test_set_tokens_does_not_authenticate() {
        let state = SessionState::default().reduce(AuthAction::SetTokens(tokens()));
        assert!(!state.is_authenticated);
        assert!(state.tokens.is_some());
    }

    #[test]
    fn test_authenticated_iff_set_user_after_last_clear() {
        let sequences: Vec<(Vec<AuthAction>, bool)> = vec![
            (vec![AuthAction::SetUser(user("user"))], true),
            (
                vec![AuthAction::SetUser(user("user")), AuthAction::ClearAuth],
                false,
            ),
            (
                vec![
                    AuthAction::ClearAuth,
                    AuthAction::SetUser(user("user")),
                    AuthAction::SetTokens(tokens()),
                    AuthAction::SetError(Some("boom".into())),
                ],
                true,
            ),
            (
                vec![
                    AuthAction::SetUser(user("user")),
                    AuthAction::ClearAuth,
                    AuthAction::SetTokens(tokens()),
                    AuthAction::SetLoading(false),
                ],
                false,
            ),
        ];

        for (actions, expected) in sequences {
            let state = actions
                .into_iter()
                .fold(SessionState::default(), SessionState::reduce);
            assert_eq!(state.is_authenticated, expected);
        }
    }

    #[test]
    fn test_clear_auth_keeps_error() {
        let state = SessionState::default()
            .reduce(AuthAction::SetUser(user("user")))
            .reduce(AuthAction::SetError(Some("Session expired".into())))
            .reduce(AuthAction::ClearAuth);
        assert_eq!(state.error.as_deref(), Some("Session expired"));
        assert!(state.tokens.is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_dispatches() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();

        store.dispatch(AuthAction::SetTokens(tokens()));
        store.dispatch(AuthAction::SetUser(user("admin")));

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated);
        assert_eq!(store.refresh_token().as_deref(), Some("ref"));
    }
}
