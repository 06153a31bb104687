use std::{env, io::Write, net::IpAddr};

use chow_common::{
    helpers::{parse_boolean_flag, parse_number},
    Secret,
};
use chrono::Duration;
use log::*;
use paystack_tools::PaystackConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_CHOW_HOST: &str = "127.0.0.1";
const DEFAULT_CHOW_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/chow_store.db";
const DEFAULT_PENDING_FUNDING_TIMEOUT_MINS: i64 = 60;
const DEFAULT_EXPIRY_CHECK_INTERVAL_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// Pending funding transactions older than this are marked as failed by the expiry worker.
    pub pending_funding_timeout: Duration,
    /// How often the expiry worker runs.
    pub expiry_check_interval: std::time::Duration,
    pub paystack: PaystackConfig,
    /// If supplied, requests against /paystack endpoints will be checked against a whitelist of Paystack IP
    /// addresses. To explicitly disable the whitelist, set this to "false", "none", or "0".
    pub paystack_whitelist: Option<Vec<IpAddr>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CHOW_HOST.to_string(),
            port: DEFAULT_CHOW_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            pending_funding_timeout: Duration::minutes(DEFAULT_PENDING_FUNDING_TIMEOUT_MINS),
            expiry_check_interval: std::time::Duration::from_secs(DEFAULT_EXPIRY_CHECK_INTERVAL_SECS),
            paystack: PaystackConfig::default(),
            paystack_whitelist: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CHOW_HOST").ok().unwrap_or_else(|| DEFAULT_CHOW_HOST.into());
        let port = env::var("CHOW_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CHOW_PORT. {e} Using the default, {DEFAULT_CHOW_PORT}, instead."
                    );
                    DEFAULT_CHOW_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CHOW_PORT);
        let database_url = env::var("CHOW_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CHOW_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("CHOW_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("CHOW_USE_FORWARDED").ok(), false);
        let (pending_funding_timeout, expiry_check_interval) = configure_expiry();
        let paystack = PaystackConfig::new_from_env_or_default();
        let paystack_whitelist = configure_whitelist(env::var("CHOW_PAYSTACK_IP_WHITELIST").ok());
        Self {
            host,
            port,
            database_url,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            pending_funding_timeout,
            expiry_check_interval,
            paystack,
            paystack_whitelist,
        }
    }
}

fn configure_expiry() -> (Duration, std::time::Duration) {
    let timeout_mins = parse_number::<i64>(env::var("CHOW_PENDING_FUNDING_TIMEOUT").ok())
        .filter(|m| *m > 0)
        .unwrap_or_else(|| {
            info!(
                "🪛️ CHOW_PENDING_FUNDING_TIMEOUT is not set or invalid. Using the default value of \
                 {DEFAULT_PENDING_FUNDING_TIMEOUT_MINS} minutes."
            );
            DEFAULT_PENDING_FUNDING_TIMEOUT_MINS
        });
    let interval_secs = parse_number::<u64>(env::var("CHOW_EXPIRY_CHECK_INTERVAL").ok())
        .filter(|s| *s > 0)
        .unwrap_or_else(|| {
            info!(
                "🪛️ CHOW_EXPIRY_CHECK_INTERVAL is not set or invalid. Using the default value of \
                 {DEFAULT_EXPIRY_CHECK_INTERVAL_SECS} seconds."
            );
            DEFAULT_EXPIRY_CHECK_INTERVAL_SECS
        });
    (Duration::minutes(timeout_mins), std::time::Duration::from_secs(interval_secs))
}

pub fn configure_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let whitelist = value.and_then(|s| {
        if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
            info!(
                "🪛️ Paystack IP whitelist is disabled. If this is not what you want, set CHOW_PAYSTACK_IP_WHITELIST to \
                 a comma-separated list of IP addresses to enable it."
            );
            return None;
        }
        let ip_addrs = s
            .split(',')
            .filter_map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| {
                        warn!("🪛️ Ignoring invalid IP address ({s}) in CHOW_PAYSTACK_IP_WHITELIST: {e}");
                    })
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The Paystack IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 webhooks."
            );
        },
        None => {
            info!("🪛️ No Paystack IP whitelist is set. Only signature validation will be used.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Paystack IP whitelist: {addrs}");
        },
    }
    whitelist
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HS256 secret shared with the identity service that issues access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since no token issued elsewhere will be accepted. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "{secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                     you are doing it wrong! Set the CHOW_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("CHOW_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [CHOW_JWT_SECRET]")))?;
        if secret.trim().len() < 32 {
            return Err(ServerError::ConfigurationError(
                "CHOW_JWT_SECRET must be at least 32 characters long".to_string(),
            ));
        }
        Ok(Self { jwt_secret: Secret::new(secret.trim().to_string()) })
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
