//! Application services shared by route handlers.

pub mod admin_bootstrap;
pub mod auth;
pub mod cookies;
pub mod email;

pub use admin_bootstrap::{bootstrap_admin, BootstrapError, BootstrapOutcome};
pub use auth::{AuthError, AuthService, IssuedSession, LoginResult};
pub use cookies::CookieHelper;
pub use email::{EmailError, EmailService, HelpNotification};
