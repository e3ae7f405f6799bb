//! Proxy credentials
//!
//! Proxies are listed one per line as `login:pass@host:port`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::SchedulerError;

/// Login, password and address of one HTTP proxy
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyCredential {
    pub login: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl ProxyCredential {
    /// Proxy endpoint without credentials
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Stable key used in output file names
    pub fn key(&self) -> String {
        format!("{}_{}", self.host, self.port)
    }
}

impl FromStr for ProxyCredential {
    type Err = SchedulerError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let invalid = |reason: &str| SchedulerError::InvalidProxy {
            line: line.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = line.split('@').flat_map(|part| part.split(':')).collect();
        let [login, password, host, port] = parts.as_slice() else {
            return Err(invalid("expected login:pass@host:port"));
        };

        if host.is_empty() {
            return Err(invalid("empty host"));
        }

        let port = port
            .parse::<u16>()
            .map_err(|e| invalid(&format!("bad port: {e}")))?;

        Ok(Self {
            login: (*login).to_string(),
            password: (*password).to_string(),
            host: (*host).to_string(),
            port,
        })
    }
}

// Keep passwords out of logs
impl fmt::Debug for ProxyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyCredential")
            .field("login", &self.login)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl fmt::Display for ProxyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.login, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_proxy_line() {
        let proxy: ProxyCredential = "user:secret@10.0.0.1:8080".parse().unwrap();
        assert_eq!(proxy.login, "user");
        assert_eq!(proxy.password, "secret");
        assert_eq!(proxy.host, "10.0.0.1");
        assert_eq!(proxy.port, 8080);
        assert_eq!(proxy.endpoint(), "http://10.0.0.1:8080");
        assert_eq!(proxy.key(), "10.0.0.1_8080");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let proxy: ProxyCredential = "  user:secret@host:3128\r".parse().unwrap();
        assert_eq!(proxy.host, "host");
        assert_eq!(proxy.port, 3128);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("10.0.0.1:8080".parse::<ProxyCredential>().is_err());
        assert!("user:secret@10.0.0.1".parse::<ProxyCredential>().is_err());
        assert!("user:secret@10.0.0.1:http".parse::<ProxyCredential>().is_err());
        assert!("user:secret@:80".parse::<ProxyCredential>().is_err());
    }

    #[test]
    fn test_password_is_masked() {
        let proxy: ProxyCredential = "user:secret@host:80".parse().unwrap();
        assert!(!format!("{proxy:?}").contains("secret"));
        assert!(!proxy.to_string().contains("secret"));
    }
}
