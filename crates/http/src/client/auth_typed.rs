//! Type-safe authentication client extensions

use super::{
    error::ClientError,
    typed::{AuthenticatedClinicClient, PublicClinicClient},
};
use crate::types::{
    AuthResponse, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest, LogoutRequest,
    MeResponse, RefreshRequest, RegisterRequest,
};

/// Authentication endpoints for public client
impl PublicClinicClient {
    /// Exchange credentials for a token pair
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let req = self
            .request(reqwest::Method::POST, "/auth/login")
            .json(request);
        self.execute(req).await
    }

    /// Create an account; the response signs the new user in
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let req = self
            .request(reqwest::Method::POST, "/auth/register")
            .json(request);
        self.execute(req).await
    }

    /// Trade a refresh token for a new token pair
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<AuthResponse, ClientError> {
        let req = self
            .request(reqwest::Method::POST, "/auth/refresh")
            .json(request);
        self.execute(req).await
    }

    /// Ask the server to email a password reset link
    pub async fn forgot_password(
        &self,
        request: &ForgotPasswordRequest,
    ) -> Result<ForgotPasswordResponse, ClientError> {
        let req = self
            .request(reqwest::Method::POST, "/auth/forgot-password")
            .json(request);
        self.execute(req).await
    }
}

/// Authentication endpoints for authenticated client
impl AuthenticatedClinicClient {
    /// Get current user info (requires authentication)
    pub async fn me(&self) -> Result<MeResponse, ClientError> {
        let request = self.request(reqwest::Method::GET, "/auth/me");
        self.execute(request).await
    }

    /// Revoke the session server-side
    pub async fn logout(&self, request: &LogoutRequest) -> Result<(), ClientError> {
        let req = self
            .request(reqwest::Method::POST, "/auth/logout")
            .json(request);
        self.execute_unit(req).await
    }
}
