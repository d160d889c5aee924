//! CLI commands

use anyhow::{Result, anyhow, bail};
use clap::Subcommand;
use clinic_frontend_common::auth::guards::{GuardOutcome, Route};
use clinic_frontend_common::auth::RestoreOutcome;
use clinic_frontend_common::client::Method;
use clinic_frontend_common::validation::{LoginForm, RegisterForm};
use clinic_frontend_common::{ClinicApp, FlowError, Notification};
use serde_json::{Value, json};
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        email: String,

        #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: String,

        /// Keep the session after this command exits (default from storage.remember_me_default)
        #[arg(long)]
        remember: bool,

        /// Keep the session for this command only, whatever the configured default
        #[arg(long, conflicts_with = "remember")]
        no_remember: bool,
    },

    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,

        email: String,

        #[arg(long, env = "CLINIC_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        remember: bool,

        #[arg(long, conflicts_with = "remember")]
        no_remember: bool,
    },

    /// Sign out and revoke the stored session
    Logout,

    /// Print the signed-in user
    Whoami,

    /// Print the session state
    Status,

    /// GET an API path with the current session, refreshing it if needed
    Get { path: String },

    /// Request a password reset link
    ForgotPassword { email: String },

    /// Show where navigating to a site path would end up
    Route { path: String },
}

impl Commands {
    pub async fn execute(self, app: &ClinicApp) -> Result<()> {
        let restored = app.start().await;
        info!(?restored, "Session restore finished");

        match self {
            Self::Login {
                email,
                password,
                remember,
                no_remember,
            } => {
                let form = LoginForm {
                    email,
                    password,
                    remember_me: remember_choice(remember, no_remember, app.remember_me_default()),
                };
                let user = app.flows().login(&form).await.map_err(flow_failure)?;
                println!("Signed in as {} ({})", user.display_name, user.role);
                Ok(())
            }
            Self::Register {
                name,
                email,
                password,
                remember,
                no_remember,
            } => {
                let form = RegisterForm {
                    name,
                    email,
                    confirm_password: password.clone(),
                    password,
                    remember_me: remember_choice(remember, no_remember, app.remember_me_default()),
                };
                let user = app.flows().register(&form).await.map_err(flow_failure)?;
                println!("Welcome, {}", user.display_name);
                Ok(())
            }
            Self::Logout => {
                print_notification(&app.flows().logout().await);
                Ok(())
            }
            Self::Whoami => match restored {
                RestoreOutcome::LoggedIn(user) => {
                    println!("{}", serde_json::to_string_pretty(&user)?);
                    Ok(())
                }
                RestoreOutcome::LoggedOut => bail!("not signed in"),
                RestoreOutcome::Cancelled => bail!("session restore was cancelled"),
            },
            Self::Status => {
                let state = app.state();
                let tokens = app.tokens();
                let status = json!({
                    "authenticated": state.is_authenticated,
                    "role": state.role().map(ToString::to_string),
                    "persistent": tokens.is_persistent(),
                    "expires_at": tokens.expires_at().map(|at| at.to_rfc3339()),
                    "error": state.error,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
                Ok(())
            }
            Self::Get { path } => get(app, &path).await,
            Self::ForgotPassword { email } => {
                let notice = app
                    .flows()
                    .forgot_password(&email)
                    .await
                    .map_err(flow_failure)?;
                print_notification(&notice);
                Ok(())
            }
            Self::Route { path } => {
                let route = Route::recognize(&path);
                match app.navigate(route) {
                    GuardOutcome::Render => println!("{route} renders"),
                    GuardOutcome::Redirect(target) => println!("{route} redirects to {target}"),
                    GuardOutcome::Pending => println!("{route} is waiting for the session"),
                }
                Ok(())
            }
        }
    }
}

async fn get(app: &ClinicApp, path: &str) -> Result<()> {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    let scope = app.view_scope();
    let interrupt = scope.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let result = app
        .client()
        .execute_cancellable::<Value, _>(
            |client| client.request(Method::GET, &path),
            &scope,
        )
        .await;
    watcher.abort();

    let body = result?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

/// An explicit flag wins over the configured default
fn remember_choice(remember: bool, no_remember: bool, default: bool) -> bool {
    if remember {
        true
    } else if no_remember {
        false
    } else {
        default
    }
}

fn print_notification(notice: &Notification) {
    println!("{notice}");
}

fn flow_failure(error: FlowError) -> anyhow::Error {
    match error.field_errors() {
        Some(fields) => anyhow!("{fields}"),
        None => anyhow!("{}", error.notification().message),
    }
}
