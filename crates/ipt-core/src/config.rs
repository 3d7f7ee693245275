use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Exporter settings, loaded from YAML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterConfig {
    #[serde(default = "default_commands")]
    pub commands: Vec<CommandConfig>,
}

/// One save command to scrape, e.g. `iptables-save -c`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandConfig {
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

fn default_commands() -> Vec<CommandConfig> {
    vec![
        CommandConfig::new("iptables-save"),
        CommandConfig::new("ip6tables-save"),
    ]
}

// Counters are only included with -c.
fn default_args() -> Vec<String> {
    vec!["-c".to_string()]
}

impl CommandConfig {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: default_args(),
        }
    }
}

impl ExporterConfig {
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read exporter config from {:?}", path))?;
        Self::from_yaml(&content).context("Failed to parse exporter config YAML")
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            commands: default_commands(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_commands() {
        let config = ExporterConfig::default();
        let programs: Vec<&str> = config.commands.iter().map(|c| c.program.as_str()).collect();
        assert_eq!(programs, vec!["iptables-save", "ip6tables-save"]);
        assert!(config.commands.iter().all(|c| c.args == vec!["-c"]));
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = ExporterConfig::from_yaml("{}").unwrap();
        assert_eq!(config, ExporterConfig::default());
    }

    #[test]
    fn test_custom_commands() {
        let yaml = r#"
commands:
  - program: iptables-legacy-save
  - program: /usr/sbin/iptables-nft-save
    args: ["-c", "-t", "filter"]
"#;
        let config = ExporterConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.commands.len(), 2);
        assert_eq!(config.commands[0].program, "iptables-legacy-save");
        assert_eq!(config.commands[0].args, vec!["-c"]);
        assert_eq!(config.commands[1].args, vec!["-c", "-t", "filter"]);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(ExporterConfig::from_yaml("commands: 12").is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = ExporterConfig::from_file(Path::new("/nonexistent/exporter.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read exporter config"));
    }
}
