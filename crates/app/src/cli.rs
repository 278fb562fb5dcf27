//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use quoteconnect_domain::{Role, SignupRequest};
use quoteconnect_infrastructure::{AppConfig, ProviderKind};

/// QuoteConnect session client
#[derive(Parser, Debug)]
#[command(name = "quoteconnect", version)]
#[command(about = "Sign in to QuoteConnect and check what your role can access")]
pub struct Cli {
    /// Identity provider: local or remote
    #[arg(long, env = "QUOTECONNECT_PROVIDER", global = true)]
    pub provider: Option<ProviderKind>,

    /// Base URL of the hosted backend
    #[arg(long, env = "QUOTECONNECT_BACKEND_URL", global = true)]
    pub backend_url: Option<String>,

    /// Anonymous project key for the hosted backend
    #[arg(long, env = "QUOTECONNECT_ANON_KEY", global = true, hide_env_values = true)]
    pub anon_key: Option<String>,

    /// Storage file for the session and tokens
    #[arg(long = "storage", env = "QUOTECONNECT_STORAGE_PATH", global = true)]
    pub storage_path: Option<PathBuf>,

    /// Seconds to wait for the provider, 0 to wait indefinitely
    #[arg(long, env = "QUOTECONNECT_TIMEOUT_SECS", global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Overlays the flags and `QUOTECONNECT_*` variables that were given on `config`.
    #[must_use]
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(url) = &self.backend_url {
            config.backend_url = Some(url.trim().trim_end_matches('/').to_string());
        }
        if let Some(key) = &self.anon_key {
            config.anon_key = Some(key.clone());
        }
        if let Some(path) = &self.storage_path {
            config.storage_path.clone_from(path);
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
        config
    }
}

/// What to do.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Signup(SignupArgs),
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Check whether the current session may open a route
    Access {
        /// Route path, e.g. /products
        path: String,
    },
    /// List the navigation links for the current session
    Nav,
}

/// Signup form fields.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SignupArgs {
    /// Account email
    #[arg(long)]
    pub email: String,
    /// Password, at least 6 characters
    #[arg(long)]
    pub password: String,
    /// Given name
    #[arg(long)]
    pub first_name: String,
    /// Family name
    #[arg(long)]
    pub last_name: String,
    /// customer, vendor or intern
    #[arg(long)]
    pub role: Option<Role>,
    /// Contact phone (required for customers)
    #[arg(long)]
    pub phone: Option<String>,
    /// Company name (required for vendors)
    #[arg(long)]
    pub company: Option<String>,
}

impl From<SignupArgs> for SignupRequest {
    fn from(args: SignupArgs) -> Self {
        Self {
            email: args.email.trim().to_string(),
            password: args.password,
            first_name: args.first_name.trim().to_string(),
            last_name: args.last_name.trim().to_string(),
            role: args.role,
            phone: args.phone.filter(|p| !p.trim().is_empty()),
            company: args.company.filter(|c| !c.trim().is_empty()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_signup() {
        let cli = Cli::try_parse_from([
            "quoteconnect",
            "--provider",
            "local",
            "signup",
            "--email",
            "v@acme.test",
            "--password",
            "secret1",
            "--first-name",
            "Vera",
            "--last-name",
            "Vendor",
            "--role",
            "vendor",
            "--company",
            "Acme",
        ])
        .unwrap();

        assert_eq!(cli.provider, Some(ProviderKind::Local));
        let Command::Signup(args) = cli.command else {
            unreachable!("parsed a different command");
        };
        let request = SignupRequest::from(args);
        assert_eq!(request.role, Some(Role::Vendor));
        assert_eq!(request.company.as_deref(), Some("Acme"));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_settings_read_their_variables() {
        use clap::CommandFactory;
        let command = Cli::command();
        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .map(|env| env.to_string_lossy().into_owned())
        };

        assert_eq!(env_of("provider").as_deref(), Some("QUOTECONNECT_PROVIDER"));
        assert_eq!(env_of("backend_url").as_deref(), Some("QUOTECONNECT_BACKEND_URL"));
        assert_eq!(env_of("anon_key").as_deref(), Some("QUOTECONNECT_ANON_KEY"));
        assert_eq!(env_of("storage_path").as_deref(), Some("QUOTECONNECT_STORAGE_PATH"));
        assert_eq!(env_of("timeout_secs").as_deref(), Some("QUOTECONNECT_TIMEOUT_SECS"));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "quoteconnect",
            "whoami",
            "--storage",
            "/tmp/qc.json",
            "--timeout-secs",
            "3",
        ])
        .unwrap();

        let config = cli.apply(AppConfig::default());
        assert_eq!(config.storage_path, PathBuf::from("/tmp/qc.json"));
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(cli.command, Command::Whoami);
    }
}
