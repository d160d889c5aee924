//! Authentication API service and the login/register/logout flows

use crate::auth::context::{AuthAction, SessionStore};
use crate::auth::error_messages::{AuthOperation, GENERIC_ERROR, user_friendly_error};
use crate::auth::token_store::TokenStore;
use crate::notification::Notification;
use crate::validation::{
    FieldErrors, LoginForm, RegisterForm, validate_email, validate_login, validate_register,
};
use chrono::Utc;
use clinic_core::User;
use clinic_http::ClientError;
use clinic_http::PublicClinicClient;
use clinic_http::types::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, LogoutRequest, RefreshRequest,
    RegisterRequest,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Authentication API service
#[derive(Clone)]
pub struct AuthApiService {
    client: PublicClinicClient,
}

impl AuthApiService {
    /// Create a new auth API service
    pub const fn new(client: PublicClinicClient) -> Self {
        Self { client }
    }

    pub const fn client(&self) -> &PublicClinicClient {
        &self.client
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.client.login(&request).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ClientError> {
        let request = RegisterRequest {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.client.register(&request).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, ClientError> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_string(),
        };
        self.client.refresh(&request).await
    }

    /// Fetch the current user and normalize it
    pub async fn me(&self, access_token: &str) -> Result<User, ClientError> {
        let response = self.client.authenticate(access_token).me().await?;
        Ok(User::from(response.into_user()))
    }

    pub async fn logout(
        &self,
        access_token: &str,
        refresh_token: Option<String>,
    ) -> Result<(), ClientError> {
        self.client
            .authenticate(access_token)
            .logout(&LogoutRequest { refresh_token })
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, ClientError> {
        let request = ForgotPasswordRequest {
            email: email.trim().to_string(),
        };
        Ok(self.client.forgot_password(&request).await?.message)
    }
}

/// Failure of an auth flow, already shaped for display
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Caught before any network call; shown inline per field
    #[error("{0}")]
    Validation(FieldErrors),

    /// The server refused the request
    #[error("{0}")]
    Rejected(String),

    /// Network failure or unexpected server error
    #[error("Something went wrong. Please try again later.")]
    Unavailable,
}

impl FlowError {
    fn from_client(operation: AuthOperation, error: &ClientError) -> Self {
        user_friendly_error(operation, error).map_or(Self::Unavailable, Self::Rejected)
    }

    pub fn notification(&self) -> Notification {
        match self {
            Self::Validation(_) => Notification::error("Please correct the highlighted fields."),
            Self::Rejected(message) => Notification::error(message.clone()),
            Self::Unavailable => Notification::error(GENERIC_ERROR),
        }
    }

    pub const fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// The login, registration, logout and password-reset flows
///
/// Each flow validates input, talks to the API, then updates the token
/// store and session state. Errors never escape as transport errors.
#[derive(Clone)]
pub struct AuthFlows {
    api: AuthApiService,
    tokens: Arc<TokenStore>,
    session: SessionStore,
}

impl AuthFlows {
    pub const fn new(api: AuthApiService, tokens: Arc<TokenStore>, session: SessionStore) -> Self {
        Self {
            api,
            tokens,
            session,
        }
    }

    fn establish(&self, response: AuthResponse, persist: bool) -> Result<User, FlowError> {
        let Some(user) = response.user else {
            warn!("Auth response carried no user");
            return Err(self.fail(FlowError::Unavailable));
        };
        let user = User::from(user);
        let tokens = response.tokens.into_session_tokens(Utc::now());

        self.tokens.save(&tokens, persist);
        self.session.dispatch(AuthAction::SetTokens(tokens));
        self.session.dispatch(AuthAction::SetUser(user.clone()));
        info!(user_id = %user.id, role = %user.role, persist, "Signed in");
        Ok(user)
    }

    fn fail(&self, error: FlowError) -> FlowError {
        self.session
            .dispatch(AuthAction::SetError(Some(error.notification().message)));
        error
    }

    /// # Errors
    ///
    /// Returns a displayable error when validation or the API call fails
    pub async fn login(&self, form: &LoginForm) -> Result<User, FlowError> {
        validate_login(form).map_err(FlowError::Validation)?;
        self.session.dispatch(AuthAction::SetError(None));

        match self.api.login(&form.email, &form.password).await {
            Ok(response) => self.establish(response, form.remember_me),
            Err(err) => {
                warn!(error = %err, "Login failed");
                Err(self.fail(FlowError::from_client(AuthOperation::Login, &err)))
            }
        }
    }

    /// # Errors
    ///
    /// Returns a displayable error when validation or the API call fails
    pub async fn register(&self, form: &RegisterForm) -> Result<User, FlowError> {
        validate_register(form).map_err(FlowError::Validation)?;
        self.session.dispatch(AuthAction::SetError(None));

        match self
            .api
            .register(&form.name, &form.email, &form.password)
            .await
        {
            Ok(response) => self.establish(response, form.remember_me),
            Err(err) => {
                warn!(error = %err, "Registration failed");
                Err(self.fail(FlowError::from_client(AuthOperation::Register, &err)))
            }
        }
    }

    /// Sign out locally, telling the server when there is a session to revoke
    pub async fn logout(&self) -> Notification {
        let access_token = self
            .session
            .access_token()
            .or_else(|| self.tokens.access_token());
        let refresh_token = self
            .session
            .refresh_token()
            .or_else(|| self.tokens.refresh_token());

        if let Some(access_token) = access_token {
            if let Err(err) = self.api.logout(&access_token, refresh_token).await {
                warn!(error = %err, "Server-side logout failed; clearing local session anyway");
            }
        }

        self.tokens.clear();
        self.session.dispatch(AuthAction::ClearAuth);
        info!("Signed out");
        Notification::info("You have been logged out.")
    }

    /// # Errors
    ///
    /// Returns a displayable error when validation or the API call fails
    pub async fn forgot_password(&self, email: &str) -> Result<Notification, FlowError> {
        validate_email(email).map_err(FlowError::Validation)?;

        match self.api.forgot_password(email).await {
            Ok(message) => Ok(Notification::success(message.unwrap_or_else(|| {
                "If that email is registered, a reset link is on its way.".to_string()
            }))),
            Err(err) => {
                warn!(error = %err, "Password reset request failed");
                Err(FlowError::from_client(AuthOperation::ForgotPassword, &err))
            }
        }
    }
}
