use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Ballot, allow-list and win rule for one election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub candidates: Vec<String>,
    pub voters: Vec<String>,
    #[serde(default = "default_threshold")]
    pub win_threshold: u64,
    #[serde(default = "default_close_on_win")]
    pub close_on_win: bool,
}

fn default_name() -> String {
    "Blockchain Voting".to_string()
}

fn default_threshold() -> u64 {
    3
}

fn default_close_on_win() -> bool {
    true
}

impl Default for ElectionConfig {
    fn default() -> Self {
        ElectionConfig {
            name: default_name(),
            candidates: vec!["Alice".into(), "Bob".into(), "Charlie".into()],
            voters: Self::demo_voters(10),
            win_threshold: default_threshold(),
            close_on_win: default_close_on_win(),
        }
    }
}

impl ElectionConfig {
    /// `V1` through `Vn`.
    pub fn demo_voters(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("V{}", i)).collect()
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ElectionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidates.is_empty() {
            return Err(ConfigError::Invalid("no candidates".into()));
        }
        let mut seen = HashSet::new();
        for candidate in &self.candidates {
            if !seen.insert(candidate.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "candidate {} listed twice",
                    candidate
                )));
            }
        }
        if self.voters.is_empty() {
            return Err(ConfigError::Invalid("no eligible voters".into()));
        }
        if self.win_threshold == 0 {
            return Err(ConfigError::Invalid("win_threshold must be at least 1".into()));
        }
        Ok(())
    }
}

/// Process settings for the HTTP front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub election_config: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9095,
            election_config: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig::default();
        if let Some(host) = lookup("SERVER_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            config.port = port.parse::<u16>().map_err(|_| ConfigError::BadEnv {
                name: "SERVER_PORT",
                expected: "u16",
                value: port,
            })?;
        }
        config.election_config = lookup("ELECTION_CONFIG");
        Ok(config)
    }

    /// Reads `ELECTION_CONFIG` if set, otherwise the demo election.
    pub fn election(&self) -> Result<ElectionConfig, ConfigError> {
        match &self.election_config {
            Some(path) => ElectionConfig::load(path),
            None => Ok(ElectionConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn demo_defaults() {
        let config = ElectionConfig::default();
        assert_eq!(config.candidates, vec!["Alice", "Bob", "Charlie"]);
        assert_eq!(config.voters.len(), 10);
        assert_eq!(config.voters[0], "V1");
        assert_eq!(config.voters[9], "V10");
        assert_eq!(config.win_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_json_with_defaults() {
        let config = ElectionConfig::from_json(
            r#"{"candidates":["Modi","Trump","Putin","Kim Jong","Harsh"],"voters":["V1","V2"]}"#,
        )
        .unwrap();
        assert_eq!(config.candidates.len(), 5);
        assert_eq!(config.win_threshold, 3);
        assert!(config.close_on_win);
    }

    #[test]
    fn rejects_bad_elections() {
        let cases = [
            r#"{"candidates":[],"voters":["V1"]}"#,
            r#"{"candidates":["A","A"],"voters":["V1"]}"#,
            r#"{"candidates":["A"],"voters":[]}"#,
            r#"{"candidates":["A"],"voters":["V1"],"win_threshold":0}"#,
        ];
        for json in cases {
            assert!(matches!(
                ElectionConfig::from_json(json),
                Err(ConfigError::Invalid(_))
            ));
        }
        assert!(matches!(
            ElectionConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn server_config_from_lookup() {
        let vars: HashMap<&str, &str> =
            HashMap::from([("SERVER_PORT", "10040"), ("ELECTION_CONFIG", "e.json")]);
        let config = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.port, 10040);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.election_config.as_deref(), Some("e.json"));
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = ServerConfig::from_lookup(|k| (k == "SERVER_PORT").then(|| "abc".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::BadEnv { name: "SERVER_PORT", .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let config = ServerConfig {
            election_config: Some("/nonexistent/election.json".into()),
            ..ServerConfig::default()
        };
        assert!(matches!(config.election(), Err(ConfigError::Read { .. })));
    }
}
