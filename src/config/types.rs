use std::time::Duration;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::store::StoreConfig;
use crate::resolvers::ResolverConfig;

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0: the backend to talk to, where the token lives,
/// how sessions are resolved and how long guards wait.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub api: ApiConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Loads the YAML file at `path`, then lets `SESSIONGATE_*` environment
/// variables override single values (`SESSIONGATE_API__BASE_URL=...`).
pub fn load_config(path: &str) -> Result<ConfigV1, figment::Error> {
    let figment = Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed("SESSIONGATE_").split("__"));
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Parses a configuration held in memory. Used by tests and embedders.
pub fn parse_config(yaml: &str) -> Result<ConfigV1, figment::Error> {
    match Figment::new().merge(Yaml::string(yaml)).extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Renders the JSON schema for the configuration.
pub fn config_schema() -> String {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// The REST backend every call goes to.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub timeout_in_ms: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_in_ms)
    }
}

fn default_request_timeout() -> u64 {
    10_000
}

/// Paths of the auth endpoints, relative to `api.base_url`.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct EndpointsConfig {
    pub login: String,
    /// Admin logins go to their own endpoint; `None` sends them to `login`.
    pub admin_login: Option<String>,
    pub logout: String,
    pub me: String,
    pub register_company: String,
    pub register_freelancer: String,
    pub forgot_password: String,
    pub reset_password: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            login: "/auth/login".to_string(),
            admin_login: Some("/admin/auth/login".to_string()),
            logout: "/auth/logout".to_string(),
            me: "/auth/me".to_string(),
            register_company: "/auth/signup/company".to_string(),
            register_freelancer: "/freelances/register".to_string(),
            forgot_password: "/auth/forgot-password".to_string(),
            reset_password: "/auth/reset-password".to_string(),
        }
    }
}

/// Session resolution settings used at bootstrap.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct AuthConfig {
    /// Upper bound for each resolver attempt.
    #[serde(default = "default_resolve_timeout")]
    pub timeout_in_ms: u64,
    /// Tried in order; the first one that produces a user wins.
    #[serde(default = "default_resolvers")]
    pub resolvers: Vec<ResolverConfig>,
}

impl AuthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_in_ms)
    }
}

fn default_resolve_timeout() -> u64 {
    5_000
}

fn default_resolvers() -> Vec<ResolverConfig> {
    vec![ResolverConfig::WhoAmI]
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            timeout_in_ms: default_resolve_timeout(),
            resolvers: default_resolvers(),
        }
    }
}

/// One ceiling shared by route guards and layout shells.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct GuardConfig {
    #[serde(default = "default_fail_open")]
    pub fail_open_after_ms: u64,
}

impl GuardConfig {
    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.fail_open_after_ms)
    }
}

fn default_fail_open() -> u64 {
    5_000
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            fail_open_after_ms: default_fail_open(),
        }
    }
}

/// Client-side paths the guards redirect to.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct RoutesConfig {
    pub home: String,
    pub login: String,
    pub admin_login: String,
    pub talent_dashboard: String,
    pub company_dashboard: String,
    pub admin_dashboard: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            home: "/".to_string(),
            login: "/login".to_string(),
            admin_login: "/admin/login".to_string(),
            talent_dashboard: "/talent/dashboard".to_string(),
            company_dashboard: "/company/dashboard".to_string(),
            admin_dashboard: "/admin/dashboard".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
version: "1.0.0"
api:
  base_url: http://localhost:5000/api
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse_config(MINIMAL).expect("minimal config should parse");
        assert_eq!(config.api.timeout_in_ms, 10_000);
        assert_eq!(config.endpoints.login, "/auth/login");
        assert_eq!(
            config.endpoints.admin_login.as_deref(),
            Some("/admin/auth/login")
        );
        assert_eq!(config.guard.fail_open_after_ms, 5_000);
        assert_eq!(config.routes.login, "/login");
        assert!(matches!(config.store, StoreConfig::Memory));
        assert!(matches!(config.auth.resolvers[..], [ResolverConfig::WhoAmI]));
    }

    #[test]
    fn full_config_parses() {
        let yaml = r#"
version: "1.0.0"
api:
  base_url: http://localhost:5000/api
  timeout_in_ms: 2000
endpoints:
  admin_login: /admin/auth/login
store:
  type: file
  path: /tmp/sessiongate.json
auth:
  timeout_in_ms: 1500
  resolvers:
    - type: claims
    - type: profile
      path: /freelances/me
      user_type: freelancer
    - type: profile
      path: /entreprise/me
      user_type: company
guard:
  fail_open_after_ms: 3000
logging:
  level: debug
  format: json
"#;
        let config = parse_config(yaml).expect("full config should parse");
        assert_eq!(config.endpoints.admin_login.as_deref(), Some("/admin/auth/login"));
        assert_eq!(config.endpoints.logout, "/auth/logout");
        match &config.store {
            StoreConfig::File(file) => {
                assert_eq!(file.path, "/tmp/sessiongate.json");
                assert_eq!(file.key, "token");
            }
            other => panic!("unexpected store config {:?}", other),
        }
        assert_eq!(config.auth.resolvers.len(), 3);
        assert_eq!(config.guard.ceiling(), Duration::from_millis(3000));
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn unknown_version_is_rejected() {
        let yaml = r#"
version: "0.9.0"
api:
  base_url: http://localhost
"#;
        assert!(parse_config(yaml).is_err());
    }

    #[test]
    fn schema_mentions_guard_ceiling() {
        assert!(config_schema().contains("fail_open_after_ms"));
    }
}
