//! Application wiring: one instance of each session component

use crate::auth::context::{SessionState, SessionStore};
use crate::auth::guards::{GuardOutcome, Route, navigate};
use crate::auth::restore::{RestoreOutcome, restore_session};
use crate::auth::token_store::{KeyValueStore, TokenStore};
use crate::client::create_public_client;
use crate::client_wrapper::WrappedAuthClient;
use crate::config::StorageKeys;
use crate::services::auth::{AuthApiService, AuthFlows};
use clinic_core::ClinicConfig;
use clinic_http::ClientError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Session components built once at startup
///
/// Views receive what they need from here instead of reaching for globals.
/// Dropping the app (or calling [`ClinicApp::shutdown`]) cancels in-flight
/// work started under its scope.
pub struct ClinicApp {
    tokens: Arc<TokenStore>,
    session: SessionStore,
    api: AuthApiService,
    client: WrappedAuthClient,
    flows: AuthFlows,
    remember_me_default: bool,
    scope: CancellationToken,
}

impl ClinicApp {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from `config`
    pub fn new(
        config: &ClinicConfig,
        local: Arc<dyn KeyValueStore>,
        session_scope: Arc<dyn KeyValueStore>,
    ) -> Result<Self, ClientError> {
        let public = create_public_client(&config.api)?;
        let tokens = Arc::new(TokenStore::new(
            local,
            session_scope,
            StorageKeys::from(&config.storage),
        ));
        let session = SessionStore::new();
        let api = AuthApiService::new(public.clone());
        let client = WrappedAuthClient::new(public, session.clone(), tokens.clone());
        let flows = AuthFlows::new(api.clone(), tokens.clone(), session.clone());

        Ok(Self {
            tokens,
            session,
            api,
            client,
            flows,
            remember_me_default: config.storage.remember_me_default,
            scope: CancellationToken::new(),
        })
    }

    /// Run session restore; call once at mount
    pub async fn start(&self) -> RestoreOutcome {
        restore_session(&self.tokens, &self.session, &self.api, &self.scope).await
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    pub const fn client(&self) -> &WrappedAuthClient {
        &self.client
    }

    pub const fn flows(&self) -> &AuthFlows {
        &self.flows
    }

    /// Initial value of the "remember me" choice on login forms
    pub const fn remember_me_default(&self) -> bool {
        self.remember_me_default
    }

    pub fn state(&self) -> SessionState {
        self.session.snapshot()
    }

    /// Decide a navigation against the current session
    pub fn navigate(&self, route: Route) -> GuardOutcome {
        navigate(route, &self.session.snapshot())
    }

    /// Cancellation scope for one view; cancelled with the app
    pub fn view_scope(&self) -> CancellationToken {
        self.scope.child_token()
    }

    /// Cancel everything started under this app's scope
    pub fn shutdown(&self) {
        self.scope.cancel();
    }
}

impl Drop for ClinicApp {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
