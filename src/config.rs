//! Server configuration parsed from environment variables.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_COOKIE: &str = "PHPSESSID";
pub const DEFAULT_SESSION_MAX_LIFETIME_SECS: u64 = 1440;
pub const DEFAULT_LOGIN_LOCATION: &str = "index.php";
pub const DEFAULT_LOGOUT_HREF: &str = "logout.php";
pub const DEFAULT_STYLESHEET_HREF: &str = "style.css";

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set but its value could not be parsed.
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid { var: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Name of the cookie carrying the session id.
    pub session_cookie: String,
    /// Directory holding `sess_<id>` files. `None` selects the in-memory store.
    pub session_save_path: Option<PathBuf>,
    pub session_max_lifetime: Duration,
    /// Where unauthenticated requests are sent.
    pub login_location: String,
    pub logout_href: String,
    pub stylesheet_href: String,
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            session_cookie: DEFAULT_SESSION_COOKIE.to_owned(),
            session_save_path: None,
            session_max_lifetime: Duration::from_secs(DEFAULT_SESSION_MAX_LIFETIME_SECS),
            login_location: DEFAULT_LOGIN_LOCATION.to_owned(),
            logout_href: DEFAULT_LOGOUT_HREF.to_owned(),
            stylesheet_href: DEFAULT_STYLESHEET_HREF.to_owned(),
            static_dir: None,
        }
    }
}

impl Config {
    /// Build config from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric or address variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// Optional (empty values count as unset):
    /// - `HOST`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `SESSION_COOKIE`: default `PHPSESSID`
    /// - `SESSION_SAVE_PATH`: PHP session directory
    /// - `SESSION_MAX_LIFETIME_SECS`: default 1440
    /// - `LOGIN_LOCATION`: default `index.php`
    /// - `LOGOUT_HREF`: default `logout.php`
    /// - `STYLESHEET_HREF`: default `style.css`
    /// - `STATIC_DIR`: directory served for unmatched paths
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric or address variable is
    /// malformed, or if `LOGIN_LOCATION` contains control characters.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let host = match get("HOST") {
            Some(raw) => parse_var("HOST", &raw)?,
            None => defaults.host,
        };
        let port = match get("PORT") {
            Some(raw) => parse_var("PORT", &raw)?,
            None => defaults.port,
        };
        let session_max_lifetime = match get("SESSION_MAX_LIFETIME_SECS") {
            Some(raw) => Duration::from_secs(parse_var("SESSION_MAX_LIFETIME_SECS", &raw)?),
            None => defaults.session_max_lifetime,
        };

        let login_location = get("LOGIN_LOCATION").unwrap_or(defaults.login_location);
        if login_location.chars().any(char::is_control) {
            return Err(ConfigError::Invalid {
                var: "LOGIN_LOCATION",
                value: login_location,
                reason: "control characters are not allowed in a Location header".into(),
            });
        }

        Ok(Self {
            host,
            port,
            session_cookie: get("SESSION_COOKIE").unwrap_or(defaults.session_cookie),
            session_save_path: get("SESSION_SAVE_PATH").map(PathBuf::from),
            session_max_lifetime,
            login_location,
            logout_href: get("LOGOUT_HREF").unwrap_or(defaults.logout_href),
            stylesheet_href: get("STYLESHEET_HREF").unwrap_or(defaults.stylesheet_href),
            static_dir: get("STATIC_DIR").map(PathBuf::from),
        })
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e: T::Err| ConfigError::Invalid { var, value: raw.to_owned(), reason: e.to_string() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
