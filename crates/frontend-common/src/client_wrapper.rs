//! Wrapped client that recovers from expired access tokens
//!
//! Every request carries the current bearer token. A 401 triggers one
//! refresh attempt; on success the request is rebuilt with the new token and
//! sent exactly once more, on failure the session is cleared and the
//! original error is returned. Concurrent 401s each refresh independently.

use crate::auth::context::{AuthAction, SessionStore};
use crate::auth::error_messages::SESSION_EXPIRED;
use crate::auth::token_store::TokenStore;
use chrono::Utc;
use clinic_core::User;
use clinic_http::types::RefreshRequest;
use clinic_http::{ClientError, PublicClinicClient};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Client wrapper that owns the refresh-and-retry policy
#[derive(Clone)]
pub struct WrappedAuthClient {
    inner: PublicClinicClient,
    session: SessionStore,
    tokens: Arc<TokenStore>,
}

impl WrappedAuthClient {
    /// Create a new wrapped client
    pub const fn new(
        inner: PublicClinicClient,
        session: SessionStore,
        tokens: Arc<TokenStore>,
    ) -> Self {
        Self {
            inner,
            session,
            tokens,
        }
    }

    /// Session mirror first, token store as fallback
    fn current_access_token(&self) -> Option<String> {
        self.session
            .access_token()
            .or_else(|| self.tokens.access_token())
    }

    fn authorize(request: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        match access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Execute a request, refreshing the session once on 401
    ///
    /// `build` is called once per attempt so the retry carries the new
    /// token; it receives an unauthenticated client and must not set its
    /// own `Authorization` header.
    pub async fn execute<T, F>(&self, build: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn(&PublicClinicClient) -> RequestBuilder,
    {
        let access_token = self.current_access_token();
        let request = Self::authorize(build(&self.inner), access_token.as_deref());

        match self.inner.execute(request).await {
            Err(err) if err.is_auth_expired() => self.recover(err, &build).await,
            other => other,
        }
    }

    /// Like [`Self::execute`], abandoned as soon as `cancel` fires
    ///
    /// A cancelled call returns [`ClientError::Cancelled`] and leaves the
    /// session untouched, even if a refresh was in flight.
    pub async fn execute_cancellable<T, F>(
        &self,
        build: F,
        cancel: &CancellationToken,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn(&PublicClinicClient) -> RequestBuilder,
    {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("Request cancelled by caller");
                Err(ClientError::Cancelled)
            }
            result = self.execute(build) => result,
        }
    }

    async fn recover<T, F>(&self, original: ClientError, build: &F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: Fn(&PublicClinicClient) -> RequestBuilder,
    {
        let Some(refresh_token) = self.session.refresh_token() else {
            info!("Access token rejected and no refresh token held; logging out");
            self.clear_session();
            return Err(original);
        };

        let refreshed = self
            .inner
            .refresh(&RefreshRequest { refresh_token })
            .await;

        match refreshed {
            Ok(response) => {
                let tokens = response.tokens.into_session_tokens(Utc::now());
                let persist = self.tokens.is_persistent();
                self.tokens.save(&tokens, persist);
                self.session.dispatch(AuthAction::SetTokens(tokens.clone()));
                if let Some(user) = response.user {
                    self.session.dispatch(AuthAction::SetUser(User::from(user)));
                }
                debug!("Session refreshed; retrying request");

                let retry = Self::authorize(build(&self.inner), Some(&tokens.access_token));
                self.inner.execute(retry).await
            }
            Err(err) => {
                warn!(error = %err, "Token refresh failed; logging out");
                self.clear_session();
                Err(original)
            }
        }
    }

    fn clear_session(&self) {
        let was_authenticated = self.session.is_authenticated();
        self.tokens.clear();
        self.session.dispatch(AuthAction::ClearAuth);
        if was_authenticated {
            self.session
                .dispatch(AuthAction::SetError(Some(SESSION_EXPIRED.to_string())));
        }
    }

    /// GET a JSON resource
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(|client| client.request(Method::GET, path))
            .await
    }

    /// Send a JSON body and decode the JSON response
    pub async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(|client| client.request(method.clone(), path).json(body))
            .await
    }
}
