//! Command execution.

use quoteconnect_application::SignupOutcome;
use quoteconnect_domain::{
    DashboardView, Identity, Notification, Role, SignupRequest, landing_route, nav_links,
};
use quoteconnect_infrastructure::AppConfig;
use tracing::debug;

use crate::bootstrap::{Services, bootstrap};
use crate::cli::Command;
use crate::error::AppError;

/// Result of one invocation.
#[derive(Debug)]
pub struct RunReport {
    /// Notifications raised while the command ran.
    pub notifications: Vec<Notification>,
    /// Lines to print, or the failure.
    pub result: Result<Vec<String>, AppError>,
}

impl RunReport {
    /// True when the command succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Restores the session, runs `command` and collects what happened.
pub async fn run(config: &AppConfig, command: &Command) -> RunReport {
    let mut services = match bootstrap(config) {
        Ok(services) => services,
        Err(e) => {
            return RunReport {
                notifications: Vec::new(),
                result: Err(e),
            };
        }
    };

    let _watch = services.controller.watch_provider();
    let session = services.controller.restore().await;
    debug!(authenticated = session.is_authenticated(), "session restored");

    let result = execute(&services, command).await;
    RunReport {
        notifications: services.drain_notifications(),
        result,
    }
}

/// Runs `command` against already restored services.
///
/// # Errors
///
/// Returns the failed flow's error, or [`AppError::AccessDenied`] when the
/// guard does not allow the requested path.
pub async fn execute(services: &Services, command: &Command) -> Result<Vec<String>, AppError> {
    let controller = &services.controller;
    match command {
        Command::Login { email, password } => {
            let identity = controller.login(email, password).await?;
            Ok(vec![format!("signed in as {}", describe(&identity))])
        }
        Command::Signup(args) => {
            let request = SignupRequest::from(args.clone());
            match controller.signup(&request).await? {
                SignupOutcome::Complete(identity) => {
                    Ok(vec![format!("account created for {}", describe(&identity))])
                }
                SignupOutcome::ProfileIncomplete { identity, cause } => Ok(vec![
                    format!("account created for {}", describe(&identity)),
                    format!("profile incomplete: {cause}"),
                ]),
            }
        }
        Command::Logout => {
            controller.logout().await?;
            Ok(vec!["signed out".to_string()])
        }
        Command::Whoami => {
            let session = controller.session();
            Ok(session.identity().map_or_else(
                || vec!["not signed in".to_string()],
                |identity| {
                    let view = DashboardView::for_identity(identity);
                    vec![describe(identity), format!("dashboard: {}", view.title())]
                },
            ))
        }
        Command::Access { path } => {
            let decision = services.guard.check(&controller.session(), path);
            if decision.is_allowed() {
                Ok(vec![format!("{path}: {}", decision.describe())])
            } else {
                Err(AppError::AccessDenied {
                    path: path.clone(),
                    decision,
                })
            }
        }
        Command::Nav => {
            let session = controller.session();
            if !session.is_authenticated() {
                return Ok(vec![format!(
                    "not signed in; start at {}",
                    landing_route(&session)
                )]);
            }
            Ok(nav_links(session.role())
                .into_iter()
                .map(|link| format!("{:<10} {}", link.label, link.path))
                .collect())
        }
    }
}

fn describe(identity: &Identity) -> String {
    let role = identity.role.map_or("no role", Role::as_str);
    format!(
        "{} [{}] <{}> ({role})",
        identity.display_name(),
        identity.initials(),
        identity.email
    )
}
