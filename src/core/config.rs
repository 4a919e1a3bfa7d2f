use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::env;

/// Protocol version sent as `v` when none is configured
pub const DEFAULT_VERSION: &str = "1.0";

/// Credentials and protocol settings for the ESB center service.
///
/// Every constructor validates `app_key`, `customer_id` and `secret`, so a
/// `ClientConfig` that exists is always usable for signing.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    app_key: String,
    customer_id: String,
    secret: Secret<String>,
    version: String,
    base_url: Option<String>,
}

// Custom Serialize implementation - never expose secrets in serialization
impl Serialize for ClientConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("ClientConfig", 5)?;
        state.serialize_field("app_key", &self.app_key)?;
        state.serialize_field("customer_id", &self.customer_id)?;
        state.serialize_field("secret", "[REDACTED]")?;
        state.serialize_field("version", &self.version)?;
        state.serialize_field("base_url", &self.base_url)?;
        state.end()
    }
}

// Deserialization goes through the validating constructor
impl<'de> Deserialize<'de> for ClientConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ClientConfigHelper {
            #[serde(default)]
            app_key: String,
            #[serde(default)]
            customer_id: String,
            #[serde(default)]
            secret: String,
            version: Option<String>,
            base_url: Option<String>,
        }

        let helper = ClientConfigHelper::deserialize(deserializer)?;
        let mut config = Self::new(helper.app_key, helper.customer_id, helper.secret)
            .map_err(serde::de::Error::custom)?;
        if let Some(version) = helper.version {
            config = config.with_version(version);
        }
        config.base_url = helper.base_url;
        Ok(config)
    }
}

impl ClientConfig {
    /// Create a new configuration, failing if any credential is empty
    pub fn new(
        app_key: impl Into<String>,
        customer_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            app_key: app_key.into(),
            customer_id: customer_id.into(),
            secret: Secret::new(secret.into()),
            version: DEFAULT_VERSION.to_string(),
            base_url: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `{PREFIX}_APP_KEY` (e.g., `ESB_APP_KEY`)
    /// - `{PREFIX}_CUSTOMER_ID`
    /// - `{PREFIX}_SECRET`
    /// - `{PREFIX}_VERSION` (optional, defaults to `1.0`)
    /// - `{PREFIX}_BASE_URL` (optional)
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let prefix = prefix.to_uppercase();
        let required = |name: &str| {
            let var = format!("{}_{}", prefix, name);
            env::var(&var).map_err(|_| ConfigError::MissingEnvironmentVariable(var))
        };

        let mut config = Self::new(
            required("APP_KEY")?,
            required("CUSTOMER_ID")?,
            required("SECRET")?,
        )?;

        if let Ok(version) = env::var(format!("{}_VERSION", prefix)) {
            config = config.with_version(version);
        }
        config.base_url = env::var(format!("{}_BASE_URL", prefix)).ok();

        Ok(config)
    }

    /// Create configuration from a `.env` file and environment variables
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_env_file_with_path(prefix, ".env")
    }

    /// Create configuration from a specific `.env` file path
    ///
    /// A missing file is not an error; the system environment is used as is.
    #[cfg(feature = "env-file")]
    pub fn from_env_file_with_path(prefix: &str, env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(()) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env(prefix)
    }

    /// Check that every required credential is present
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("app_key", self.app_key.as_str()),
            ("customer_id", self.customer_id.as_str()),
            ("secret", self.secret.expose_secret().as_str()),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field));
            }
        }
        Ok(())
    }

    /// Set the protocol version sent as `v`
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set custom base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Get the signing secret (use carefully - exposes secret)
    pub fn secret(&self) -> &str {
        self.secret.expose_secret()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} can not be empty")]
    MissingField(&'static str),

    #[error("Missing environment variable: {0}")]
    MissingEnvironmentVariable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_default_version() {
        let config = ClientConfig::new("app", "cust", "secret").unwrap();
        assert_eq!(config.app_key(), "app");
        assert_eq!(config.customer_id(), "cust");
        assert_eq!(config.secret(), "secret");
        assert_eq!(config.version(), "1.0");
        assert!(config.base_url().is_none());
    }

    #[test]
    fn test_each_required_field_is_checked() {
        let cases = [
            (("", "cust", "secret"), "app_key"),
            (("app", "", "secret"), "customer_id"),
            (("app", "cust", ""), "secret"),
            (("app", "cust", "   "), "secret"),
        ];

        for ((app_key, customer_id, secret), field) in cases {
            match ClientConfig::new(app_key, customer_id, secret) {
                Err(ConfigError::MissingField(missing)) => assert_eq!(missing, field),
                other => panic!("expected missing {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_serialize_redacts_secret() {
        let config = ClientConfig::new("app", "cust", "super-secret").unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("[REDACTED]"));
        assert!(!json.contains("super-secret"));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_deserialize_validates() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"app_key":"app","customer_id":"cust","secret":"s","version":"2.0"}"#,
        )
        .unwrap();
        assert_eq!(config.version(), "2.0");

        let missing = serde_json::from_str::<ClientConfig>(r#"{"app_key":"app","secret":"s"}"#);
        let err = missing.unwrap_err().to_string();
        assert!(err.contains("customer_id can not be empty"));
    }

    #[test]
    fn test_from_env() {
        env::set_var("ESBTEST_APP_KEY", "env-app");
        env::set_var("ESBTEST_CUSTOMER_ID", "env-cust");
        env::set_var("ESBTEST_SECRET", "env-secret");
        env::set_var("ESBTEST_BASE_URL", "http://localhost:9000/esb/");

        let config = ClientConfig::from_env("esbtest").unwrap();
        assert_eq!(config.app_key(), "env-app");
        assert_eq!(config.version(), "1.0");
        assert_eq!(config.base_url(), Some("http://localhost:9000/esb/"));

        let missing = ClientConfig::from_env("esbtest_absent");
        assert!(matches!(
            missing,
            Err(ConfigError::MissingEnvironmentVariable(var)) if var == "ESBTEST_ABSENT_APP_KEY"
        ));
    }
}
