//! Session lifecycle for the clinic site
//!
//! - [`auth::token_store`] persists the token pair
//! - [`auth::context`] holds the in-memory session state
//! - [`client_wrapper`] attaches bearer tokens and refreshes on 401
//! - [`auth::restore`] rehydrates the session at startup
//! - [`auth::guards`] decides navigation
//! - [`services::auth`] runs the login, registration and logout flows

pub mod app;
pub mod auth;
pub mod client;
pub mod client_wrapper;
pub mod config;
pub mod notification;
pub mod services;
pub mod validation;

pub use app::ClinicApp;
pub use auth::context::{AuthAction, SessionState, SessionStore};
pub use client::create_public_client;
pub use client_wrapper::WrappedAuthClient;
pub use config::StorageKeys;
pub use notification::{Notification, NotificationLevel};
pub use services::{AuthApiService, AuthFlows, FlowError};
