//! Credential resolution for eggtray
//!
//! Provides two-tier credential resolution with ENV → TOML priority.
//!
//! GitHub App credentials win over a static token when complete. Partial
//! App credentials are a configuration error rather than a silent
//! fallback. Anonymous access is refused in the production environment.

use crate::github::{AppCredentials, GitHubAuth};
use eggtray_common::config::{Environment, TomlConfig};
use eggtray_common::{Error, Result};
use tracing::{info, warn};

pub const TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const CLIENT_ID_ENV: &str = "GITHUB_CLIENT_ID";
pub const INSTALLATION_ID_ENV: &str = "GITHUB_INSTALLATION_ID";
pub const PRIVATE_KEY_ENV: &str = "GITHUB_PRIVATE_KEY";

/// Resolve one credential value
///
/// **Priority:** ENV → TOML
fn resolve_value(name: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    // Warn if multiple sources (potential misconfiguration)
    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "GitHub {} found in multiple sources: environment, TOML. Using environment (highest priority).",
            name
        );
    }

    if let Some(value) = env_value {
        info!("GitHub {} loaded from environment variable {}", name, env_var);
        return Some(value);
    }
    toml_value.map(|value| {
        info!("GitHub {} loaded from TOML config", name);
        value.to_string()
    })
}

/// Validate credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Turn literal `\n` sequences into newlines
///
/// PEM keys passed through single-line environment variables arrive escaped.
pub fn unescape_multiline(value: &str) -> String {
    value.replace("\\n", "\n")
}

/// Resolve how to authenticate against GitHub
pub fn resolve_github_auth(config: &TomlConfig) -> Result<GitHubAuth> {
    let github = &config.github;

    let client_id = resolve_value("App client id", CLIENT_ID_ENV, github.client_id.as_deref());
    let installation_id = match resolve_value(
        "App installation id",
        INSTALLATION_ID_ENV,
        github.installation_id.map(|id| id.to_string()).as_deref(),
    ) {
        Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
            Error::Config(format!("GitHub App installation id is not a number: {:?}", raw))
        })?),
        None => None,
    };
    let private_key = resolve_value("App private key", PRIVATE_KEY_ENV, github.private_key.as_deref())
        .map(|key| unescape_multiline(&key));

    let auth = match (client_id, installation_id, private_key) {
        (Some(client_id), Some(installation_id), Some(private_key)) => {
            GitHubAuth::App(AppCredentials {
                client_id,
                installation_id,
                private_key,
            })
        }
        (None, None, None) => {
            match resolve_value("token", TOKEN_ENV, github.token.as_deref()) {
                Some(token) => GitHubAuth::Token(token),
                None => GitHubAuth::Anonymous,
            }
        }
        (client_id, installation_id, private_key) => {
            let mut missing = Vec::new();
            if client_id.is_none() {
                missing.push(CLIENT_ID_ENV);
            }
            if installation_id.is_none() {
                missing.push(INSTALLATION_ID_ENV);
            }
            if private_key.is_none() {
                missing.push(PRIVATE_KEY_ENV);
            }
            return Err(Error::Config(format!(
                "Incomplete GitHub App credentials, missing: {}",
                missing.join(", ")
            )));
        }
    };

    if auth.is_anonymous() {
        if config.environment == Environment::Production {
            return Err(Error::Config(format!(
                "GitHub credentials not configured. Please configure using one of:\n\
                 1. Environment: {}=your-token\n\
                 2. Environment: {}, {}, {} (GitHub App)\n\
                 3. TOML config: [github] token = \"your-token\"\n\
                 \n\
                 Anonymous access is only allowed with environment = \"development\"",
                TOKEN_ENV, CLIENT_ID_ENV, INSTALLATION_ID_ENV, PRIVATE_KEY_ENV
            )));
        }
        warn!("Using anonymous GitHub access (development environment)");
    }

    info!(auth = auth.describe(), "GitHub authentication resolved");
    Ok(auth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for var in [TOKEN_ENV, CLIENT_ID_ENV, INSTALLATION_ID_ENV, PRIVATE_KEY_ENV] {
            std::env::remove_var(var);
        }
    }

    fn development() -> TomlConfig {
        TomlConfig {
            environment: Environment::Development,
            ..TomlConfig::default()
        }
    }

    #[test]
    fn test_unescape_multiline() {
        assert_eq!(
            unescape_multiline("-----BEGIN-----\\nabc\\n-----END-----"),
            "-----BEGIN-----\nabc\n-----END-----"
        );
    }

    #[test]
    #[serial]
    fn test_anonymous_rejected_in_production() {
        clear_env();
        let config = TomlConfig::default();
        assert!(matches!(resolve_github_auth(&config), Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_anonymous_allowed_in_development() {
        clear_env();
        assert_eq!(resolve_github_auth(&development()).unwrap(), GitHubAuth::Anonymous);
    }

    #[test]
    #[serial]
    fn test_env_token_beats_toml() {
        clear_env();
        std::env::set_var(TOKEN_ENV, "from-env");
        let mut config = TomlConfig::default();
        config.github.token = Some("from-toml".to_string());

        let auth = resolve_github_auth(&config).unwrap();
        clear_env();
        assert_eq!(auth, GitHubAuth::Token("from-env".to_string()));
    }

    #[test]
    #[serial]
    fn test_app_credentials_from_env() {
        clear_env();
        std::env::set_var(CLIENT_ID_ENV, "Iv1.abc");
        std::env::set_var(INSTALLATION_ID_ENV, "42");
        std::env::set_var(PRIVATE_KEY_ENV, "line1\\nline2");

        let auth = resolve_github_auth(&TomlConfig::default()).unwrap();
        clear_env();
        assert_eq!(
            auth,
            GitHubAuth::App(AppCredentials {
                client_id: "Iv1.abc".to_string(),
                installation_id: 42,
                private_key: "line1\nline2".to_string(),
            })
        );
    }

    #[test]
    #[serial]
    fn test_partial_app_credentials_are_an_error() {
        clear_env();
        std::env::set_var(CLIENT_ID_ENV, "Iv1.abc");
        let result = resolve_github_auth(&development());
        clear_env();
        match result {
            Err(Error::Config(msg)) => {
                assert!(msg.contains(INSTALLATION_ID_ENV));
                assert!(msg.contains(PRIVATE_KEY_ENV));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_invalid_installation_id() {
        clear_env();
        std::env::set_var(INSTALLATION_ID_ENV, "not-a-number");
        let result = resolve_github_auth(&development());
        clear_env();
        assert!(result.is_err());
    }
}
