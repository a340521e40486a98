//! Daemon configuration, read once from the environment at startup

use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tfdeploy_core::domain::Credential;
use tfdeploy_core::port::QuotaFailurePolicy;
use tfdeploy_infra_digitalocean::DEFAULT_API_URL;
use tfdeploy_infra_system::terraform_executor::DEFAULT_BINARY;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_QUOTA_TIMEOUT_SECS: u64 = 10;

/// Daemon-only secrets, kept out of the environment handed to terraform
pub const DAEMON_SECRET_VARS: [&str; 2] = ["TFDEPLOY_AGENT_SECRET", "DO_TOKEN"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => bail!("unknown log format '{}' (expected pretty or json)", other),
        }
    }
}

pub struct DaemonConfig {
    pub agent_secret: String,
    pub default_credential: Option<Credential>,
    pub host: String,
    pub port: u16,
    pub public_url: Option<String>,
    pub terraform_bin: PathBuf,
    pub workspace_root: PathBuf,
    pub do_api_url: String,
    pub quota_timeout: Duration,
    pub quota_policy: QuotaFailurePolicy,
    pub log_format: LogFormat,
    /// Variables passed through to terraform; everything when unset
    pub env_allowlist: Option<Vec<String>>,
}

// Secrets stay out of Debug output
impl fmt::Debug for DaemonConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DaemonConfig")
            .field("agent_secret", &"***")
            .field("default_credential", &self.default_credential.is_some())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("public_url", &self.public_url)
            .field("terraform_bin", &self.terraform_bin)
            .field("workspace_root", &self.workspace_root)
            .field("do_api_url", &self.do_api_url)
            .field("quota_timeout", &self.quota_timeout)
            .field("quota_policy", &self.quota_policy)
            .field("log_format", &self.log_format)
            .field("env_allowlist", &self.env_allowlist)
            .finish()
    }
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let agent_secret = get("TFDEPLOY_AGENT_SECRET")
            .context("TFDEPLOY_AGENT_SECRET must be set")?;

        let port = match get("TFDEPLOY_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("invalid port '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        let quota_timeout_secs = match get("TFDEPLOY_QUOTA_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .with_context(|| format!("invalid TFDEPLOY_QUOTA_TIMEOUT_SECS '{}'", raw))?,
            None => DEFAULT_QUOTA_TIMEOUT_SECS,
        };

        let fail_closed = match get("TFDEPLOY_QUOTA_FAIL_CLOSED") {
            Some(raw) => parse_bool(&raw).context("invalid TFDEPLOY_QUOTA_FAIL_CLOSED")?,
            None => false,
        };
        let quota_policy = if fail_closed {
            QuotaFailurePolicy::FailClosed
        } else {
            QuotaFailurePolicy::FailOpen
        };

        let log_format = match get("TFDEPLOY_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::Pretty,
        };

        let env_allowlist = get("TFDEPLOY_ENV_ALLOWLIST").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()
        });

        Ok(Self {
            agent_secret,
            default_credential: get("DO_TOKEN").and_then(Credential::parse),
            host: get("TFDEPLOY_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            public_url: get("TFDEPLOY_PUBLIC_URL"),
            terraform_bin: get("TFDEPLOY_TERRAFORM_BIN")
                .unwrap_or_else(|| DEFAULT_BINARY.to_string())
                .into(),
            workspace_root: get("TFDEPLOY_WORKSPACE_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            do_api_url: get("TFDEPLOY_DO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            quota_timeout: Duration::from_secs(quota_timeout_secs),
            quota_policy,
            log_format,
            env_allowlist,
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<DaemonConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("TFDEPLOY_AGENT_SECRET", "s")]).unwrap();

        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.terraform_bin, PathBuf::from("terraform"));
        assert_eq!(cfg.do_api_url, DEFAULT_API_URL);
        assert_eq!(cfg.quota_timeout, Duration::from_secs(10));
        assert_eq!(cfg.quota_policy, QuotaFailurePolicy::FailOpen);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert!(cfg.default_credential.is_none());
        assert!(cfg.env_allowlist.is_none());
    }

    #[test]
    fn test_missing_secret_fails() {
        assert!(config(&[]).is_err());
        assert!(config(&[("TFDEPLOY_AGENT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn test_port_precedence() {
        let cfg = config(&[("TFDEPLOY_AGENT_SECRET", "s"), ("PORT", "9000")]).unwrap();
        assert_eq!(cfg.port, 9000);

        let cfg = config(&[
            ("TFDEPLOY_AGENT_SECRET", "s"),
            ("PORT", "9000"),
            ("TFDEPLOY_PORT", "9100"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9100);
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config(&[("TFDEPLOY_AGENT_SECRET", "s"), ("PORT", "eighty")]).is_err());
        assert!(config(&[
            ("TFDEPLOY_AGENT_SECRET", "s"),
            ("TFDEPLOY_QUOTA_TIMEOUT_SECS", "0")
        ])
        .is_err());
        assert!(config(&[
            ("TFDEPLOY_AGENT_SECRET", "s"),
            ("TFDEPLOY_QUOTA_FAIL_CLOSED", "maybe")
        ])
        .is_err());
        assert!(config(&[("TFDEPLOY_AGENT_SECRET", "s"), ("TFDEPLOY_LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("TFDEPLOY_AGENT_SECRET", "s"),
            ("DO_TOKEN", "dop_v1_default"),
            ("TFDEPLOY_QUOTA_FAIL_CLOSED", "true"),
            ("TFDEPLOY_LOG_FORMAT", "JSON"),
            ("TFDEPLOY_ENV_ALLOWLIST", "PATH, HOME,,"),
            ("TFDEPLOY_PUBLIC_URL", "https://deploy.example.com"),
        ])
        .unwrap();

        assert_eq!(cfg.quota_policy, QuotaFailurePolicy::FailClosed);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(
            cfg.env_allowlist,
            Some(vec!["PATH".to_string(), "HOME".to_string()])
        );
        assert_eq!(
            cfg.default_credential.as_ref().map(Credential::expose),
            Some("dop_v1_default")
        );
        assert_eq!(cfg.public_url.as_deref(), Some("https://deploy.example.com"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let cfg = config(&[
            ("TFDEPLOY_AGENT_SECRET", "agent-s3cret"),
            ("DO_TOKEN", "dop_v1_default"),
        ])
        .unwrap();

        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("agent-s3cret"));
        assert!(!debug.contains("dop_v1_default"));
    }
}
