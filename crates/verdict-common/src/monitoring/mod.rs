use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

mod fmt;
pub use fmt::Fmt;

mod metric;
pub use metric::Metric;

/// OTLP collector the metric layer exports to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub endpoint: String,
    pub token: Option<String>,

    #[serde(default = "Configuration::default_service_name")]
    pub service_name: String,
}

impl Configuration {
    fn default_service_name() -> String {
        "verdict".to_string()
    }

    fn headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if let Some(token) = &self.token {
            headers.insert("Authorization".to_string(), format!("Basic {}", token));
        }

        headers
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbosityConfiguration {
    Debug,
    #[default]
    Info,
}

impl FromStr for VerbosityConfiguration {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(VerbosityConfiguration::Debug),
            "info" => Ok(VerbosityConfiguration::Info),
            _ => Ok(VerbosityConfiguration::Debug),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_str() {
        assert!(matches!(VerbosityConfiguration::from_str("debug"), Ok(VerbosityConfiguration::Debug)));
        assert!(matches!(VerbosityConfiguration::from_str("info"), Ok(VerbosityConfiguration::Info)));
        assert!(matches!(VerbosityConfiguration::from_str("unknown"), Ok(VerbosityConfiguration::Debug)));
    }

    #[test]
    fn should_only_send_authorization_when_token_is_set() {
        let mut configuration: Configuration = serde_json::from_str(r#"{ "endpoint": "http://localhost:4318" }"#).unwrap();
        assert_eq!(configuration.service_name, "verdict");
        assert!(configuration.headers().is_empty());

        configuration.token = Some("secret".to_string());
        assert_eq!(configuration.headers().get("Authorization").map(String::as_str), Some("Basic secret"));
    }
}
