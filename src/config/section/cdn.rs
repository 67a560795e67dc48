//! `[cdn]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [cdn]
//! production = true            # false renders local `?v=<now>` URLs
//! domain = "cdn.example.com"   # Required in production
//! protocol = "https"           # http | https | relative
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::render::Protocol;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CdnConfig {
    pub production: bool,
    pub domain: Option<String>,
    pub protocol: Protocol,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            production: true,
            domain: None,
            protocol: Protocol::Https,
        }
    }
}

impl CdnConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match self.domain.as_deref().map(str::trim) {
            None | Some("") if self.production => {
                diag.error_with_hint(
                    "cdn.domain",
                    "required in production",
                    "set `domain = \"cdn.example.com\"` or `production = false`",
                );
            }
            Some(domain) if domain.contains("://") => {
                diag.error_with_hint(
                    "cdn.domain",
                    format!("`{domain}` includes a scheme"),
                    "use `protocol` to choose http, https or relative",
                );
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_parsing() {
        let cdn: CdnConfig =
            toml::from_str("domain = \"cdn.example.com\"\nprotocol = \"relative\"").unwrap();
        assert_eq!(cdn.protocol, Protocol::Relative);
        assert!(toml::from_str::<CdnConfig>("protocol = \"ftp\"").is_err());
    }

    #[test]
    fn test_domain_required_in_production() {
        let mut diag = ConfigDiagnostics::new();
        CdnConfig::default().validate(&mut diag);
        assert_eq!(diag.errors()[0].field, "cdn.domain");

        let mut diag = ConfigDiagnostics::new();
        let dev = CdnConfig {
            production: false,
            ..CdnConfig::default()
        };
        dev.validate(&mut diag);
        assert!(diag.is_empty());

        let mut diag = ConfigDiagnostics::new();
        let schemed = CdnConfig {
            domain: Some("https://cdn.example.com".into()),
            ..CdnConfig::default()
        };
        schemed.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
