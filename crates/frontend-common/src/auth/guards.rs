//! Route guards for protected pages
//!
//! Each guard is a pure function of [`SessionState`]. Guards nest the way
//! routes do: `AuthGuard` wraps `RoleGuard` wraps the page, so the first
//! guard that does not render decides the outcome.

use super::context::SessionState;
use clinic_core::Role;

/// Pages of the clinic site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    About,
    Services,
    Contact,
    Login,
    Register,
    ForgotPassword,
    Unauthorized,
    Account,
    AdminDashboard,
    AdminPatients,
    AdminAppointments,
    AdminTestimonials,
    NotFound,
}

impl Route {
    pub const ALL: [Self; 14] = [
        Self::Home,
        Self::About,
        Self::Services,
        Self::Contact,
        Self::Login,
        Self::Register,
        Self::ForgotPassword,
        Self::Unauthorized,
        Self::Account,
        Self::AdminDashboard,
        Self::AdminPatients,
        Self::AdminAppointments,
        Self::AdminTestimonials,
        Self::NotFound,
    ];

    pub const fn to_path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::About => "/about",
            Self::Services => "/services",
            Self::Contact => "/contact",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::ForgotPassword => "/forgot-password",
            Self::Unauthorized => "/unauthorized",
            Self::Account => "/account",
            Self::AdminDashboard => "/admin",
            Self::AdminPatients => "/admin/patients",
            Self::AdminAppointments => "/admin/appointments",
            Self::AdminTestimonials => "/admin/testimonials",
            Self::NotFound => "/404",
        }
    }

    /// Match a path, ignoring a trailing slash and any query string
    pub fn recognize(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL
            .into_iter()
            .find(|route| route.to_path() == path)
            .unwrap_or(Self::NotFound)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_path())
    }
}

/// What the router should do with a navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    Redirect(Route),
    /// Session not settled yet; show a loading indicator
    Pending,
}

pub trait RouteGuard: Send + Sync {
    fn check(&self, state: &SessionState) -> GuardOutcome;
}

/// Renders only for authenticated sessions, else sends to login
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthGuard;

impl RouteGuard for AuthGuard {
    fn check(&self, state: &SessionState) -> GuardOutcome {
        if state.is_loading {
            GuardOutcome::Pending
        } else if state.is_authenticated {
            GuardOutcome::Render
        } else {
            GuardOutcome::Redirect(Route::Login)
        }
    }
}

/// Keeps signed-in users away from login/registration pages
#[derive(Debug, Clone, Copy, Default)]
pub struct GuestGuard;

impl RouteGuard for GuestGuard {
    fn check(&self, state: &SessionState) -> GuardOutcome {
        if state.is_loading {
            GuardOutcome::Pending
        } else if state.is_authenticated {
            GuardOutcome::Redirect(Route::Home)
        } else {
            GuardOutcome::Render
        }
    }
}

/// Renders only when the user's role is in the allow-list
#[derive(Debug, Clone)]
pub struct RoleGuard {
    allowed: Vec<Role>,
}

impl RoleGuard {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl RouteGuard for RoleGuard {
    fn check(&self, state: &SessionState) -> GuardOutcome {
        if state.is_loading {
            return GuardOutcome::Pending;
        }
        match &state.user {
            Some(user) if user.has_any_role(&self.allowed) => GuardOutcome::Render,
            _ => GuardOutcome::Redirect(Route::Unauthorized),
        }
    }
}

/// Run nested guards outermost first
pub fn evaluate(guards: &[Box<dyn RouteGuard>], state: &SessionState) -> GuardOutcome {
    guards
        .iter()
        .map(|guard| guard.check(state))
        .find(|outcome| *outcome != GuardOutcome::Render)
        .unwrap_or(GuardOutcome::Render)
}

/// Guard stack for each route
pub fn guards_for(route: Route) -> Vec<Box<dyn RouteGuard>> {
    match route {
        Route::AdminDashboard
        | Route::AdminPatients
        | Route::AdminAppointments
        | Route::AdminTestimonials => vec![
            Box::new(AuthGuard),
            Box::new(RoleGuard::new([Role::Admin])),
        ],
        Route::Account => vec![Box::new(AuthGuard)],
        Route::Login | Route::Register | Route::ForgotPassword => vec![Box::new(GuestGuard)],
        Route::Home
        | Route::About
        | Route::Services
        | Route::Contact
        | Route::Unauthorized
        | Route::NotFound => Vec::new(),
    }
}

/// Decide a navigation to `route` for the given session
pub fn navigate(route: Route, state: &SessionState) -> GuardOutcome {
    evaluate(&guards_for(route), state)
}
