use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use verdict_client::Configuration as ClientConfiguration;
use verdict_common::monitoring::{Configuration as MonitoringConfiguration, VerbosityConfiguration};

use crate::Error;

const ENVIRONMENT_PREFIX: &str = "VERDICT_";

/// Settings read from the `--config` file, every field optional.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub verbosity: VerbosityConfiguration,
    pub monitoring: Option<MonitoringConfiguration>,

    pub endpoint: Option<String>,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub timeout: Option<u64>,
}

/// Overrides read from `VERDICT_*` variables.
#[derive(Debug, Default, Deserialize)]
struct Environment {
    endpoint: Option<String>,
    timeout: Option<u64>,
    verbosity: Option<String>,
}

/// Overrides given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<u64>,
}

impl Configuration {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let data = fs::read(path).map_err(|e| Error::Configuration(format!("{}: {}", path.display(), e)))?;

        serde_json::from_slice(&data).map_err(|e| Error::Configuration(e.to_string()))
    }

    pub fn with_environment(self) -> Result<Self, Error> {
        self.with_variables(std::env::vars())
    }

    fn with_variables(mut self, variables: impl IntoIterator<Item = (String, String)>) -> Result<Self, Error> {
        let environment: Environment = envy::prefixed(ENVIRONMENT_PREFIX)
            .from_iter(variables)
            .map_err(|e| Error::Configuration(e.to_string()))?;

        if let Some(endpoint) = environment.endpoint {
            self.endpoint = Some(endpoint);
        }
        if let Some(timeout) = environment.timeout {
            self.timeout = Some(timeout);
        }
        if let Some(verbosity) = environment.verbosity {
            self.verbosity = VerbosityConfiguration::from_str(&verbosity).unwrap_or_default();
        }

        Ok(self)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(endpoint) = overrides.endpoint {
            self.endpoint = Some(endpoint);
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = Some(timeout);
        }
        self.headers.extend(overrides.headers);

        self
    }

    pub fn client(&self) -> Result<ClientConfiguration, Error> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or_else(|| Error::Configuration("no endpoint, use --endpoint or VERDICT_ENDPOINT".to_string()))?;

        let mut configuration = ClientConfiguration::new(endpoint);
        configuration.headers = self.headers.clone();
        if let Some(timeout) = self.timeout {
            configuration.timeout = timeout;
        }

        Ok(configuration)
    }
}

/// Parses a `name=value` header flag.
pub fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s.split_once('=').ok_or_else(|| format!("invalid header {}, must be of the form 'name=value'", s))?;

    Ok((name.trim().to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variables(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    mod with_variables {
        use super::*;

        #[test]
        fn should_override_file_values() {
            let configuration = Configuration {
                endpoint: Some("http://file/graphql".to_string()),
                timeout: Some(3),
                ..Configuration::default()
            };

            let configuration = configuration
                .with_variables(variables(&[
                    ("VERDICT_ENDPOINT", "http://env/graphql"),
                    ("VERDICT_VERBOSITY", "debug"),
                    ("PATH", "/usr/bin"),
                ]))
                .unwrap();

            assert_eq!(configuration.endpoint.as_deref(), Some("http://env/graphql"));
            assert_eq!(configuration.timeout, Some(3));
            assert!(matches!(configuration.verbosity, VerbosityConfiguration::Debug));
        }

        #[test]
        fn should_reject_non_numeric_timeout() {
            let result = Configuration::default().with_variables(variables(&[("VERDICT_TIMEOUT", "soon")]));

            assert!(matches!(result, Err(Error::Configuration(_))));
        }
    }

    mod with_overrides {
        use super::*;

        #[test]
        fn should_take_precedence_and_merge_headers() {
            let mut configuration = Configuration {
                endpoint: Some("http://env/graphql".to_string()),
                ..Configuration::default()
            };
            configuration.headers.insert("x-api-key".to_string(), "file".to_string());
            configuration.headers.insert("x-shop".to_string(), "verdict".to_string());

            let configuration = configuration.with_overrides(Overrides {
                endpoint: Some("http://flag/graphql".to_string()),
                headers: vec![("x-api-key".to_string(), "flag".to_string())],
                timeout: Some(30),
            });

            let client = configuration.client().unwrap();
            assert_eq!(client.endpoint, "http://flag/graphql");
            assert_eq!(client.timeout, 30);
            assert_eq!(client.headers.get("x-api-key").map(String::as_str), Some("flag"));
            assert_eq!(client.headers.get("x-shop").map(String::as_str), Some("verdict"));
        }
    }

    mod client {
        use super::*;

        #[test]
        fn should_require_an_endpoint() {
            assert!(matches!(Configuration::default().client(), Err(Error::Configuration(_))));
        }

        #[test]
        fn should_keep_default_timeout_when_unset() {
            let configuration = Configuration {
                endpoint: Some("http://localhost/graphql".to_string()),
                ..Configuration::default()
            };

            assert_eq!(configuration.client().unwrap().timeout, 10);
        }
    }

    #[test]
    fn should_parse_header_flag() {
        assert_eq!(parse_header("x-api-key = secret"), Ok(("x-api-key".to_string(), "secret".to_string())));
        assert!(parse_header("x-api-key").is_err());
    }

    #[test]
    fn should_read_file_with_defaults() {
        let configuration: Configuration = serde_json::from_str(r#"{ "endpoint": "http://localhost/graphql" }"#).unwrap();

        assert!(matches!(configuration.verbosity, VerbosityConfiguration::Info));
        assert!(configuration.monitoring.is_none());
        assert!(configuration.headers.is_empty());
    }
}
