// ── Runtime connection configuration ──
//
// Describes how to reach one LogicMonitor portal. Carries credentials
// and connection tuning but never touches disk; the CLI builds a
// `PortalConfig` from its configuration file and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use lmprov_api::transport::TlsMode;
use lmprov_api::{LmCredentials, LogicMonitorClient, TransportConfig};
use secrecy::SecretString;

/// Connection settings for a single portal.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal name: `acme` for `https://acme.logicmonitor.com/`.
    pub account: String,
    pub access_id: String,
    pub access_key: SecretString,
    /// Override for the REST root (proxies, test servers).
    pub base_url: Option<String>,
    /// Extra CA certificate to trust.
    pub ca_cert: Option<PathBuf>,
    pub timeout: Duration,
}

impl PortalConfig {
    pub fn new(
        account: impl Into<String>,
        access_id: impl Into<String>,
        access_key: SecretString,
    ) -> Self {
        Self {
            account: account.into(),
            access_id: access_id.into(),
            access_key,
            base_url: None,
            ca_cert: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Build the REST client for this portal.
    pub fn build_client(&self) -> Result<LogicMonitorClient, crate::CoreError> {
        let credentials = LmCredentials::new(
            self.account.clone(),
            self.access_id.clone(),
            self.access_key.clone(),
        );
        let transport = TransportConfig {
            tls: self
                .ca_cert
                .clone()
                .map_or(TlsMode::System, TlsMode::CustomCa),
            timeout: self.timeout,
        };
        let client = match &self.base_url {
            Some(url) => LogicMonitorClient::with_base_url(url, credentials, &transport)?,
            None => LogicMonitorClient::new(credentials, &transport)?,
        };
        Ok(client)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_is_derived_from_account() {
        let config = PortalConfig::new("acme", "id", SecretString::from("key".to_string()));
        let client = config.build_client().unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://acme.logicmonitor.com/santaba/rest/"
        );
    }

    #[test]
    fn base_url_override_wins() {
        let mut config = PortalConfig::new("acme", "id", SecretString::from("key".to_string()));
        config.base_url = Some("http://127.0.0.1:9000/santaba/rest".into());
        let client = config.build_client().unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "http://127.0.0.1:9000/santaba/rest/"
        );
    }
}
