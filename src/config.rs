use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file structure for clocbot.
///
/// Holds the data root clones are written under and the bounds for the
/// fetch and analysis stages. Configuration files are loaded from the
/// current directory or a specified path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Directory clones are written under
    pub data_root: Option<PathBuf>,

    /// Existence probe and clone settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Line counting tool settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Git executable used for cloning
    #[serde(default = "default_git_program")]
    pub git_program: String,

    /// Upper bound for the reference listing request
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Upper bound for the shallow clone
    #[serde(default = "default_stage_timeout_secs")]
    pub clone_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisConfig {
    /// Line counting executable
    #[serde(default = "default_analysis_program")]
    pub program: String,

    /// Arguments placed before `-f json <path>`
    #[serde(default)]
    pub args: Vec<String>,

    /// Upper bound for the whole analysis subprocess
    #[serde(default = "default_stage_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            git_program: default_git_program(),
            probe_timeout_secs: default_probe_timeout_secs(),
            clone_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            program: default_analysis_program(),
            args: Vec::new(),
            timeout_secs: default_stage_timeout_secs(),
        }
    }
}

fn default_git_program() -> String {
    "git".to_string()
}

fn default_analysis_program() -> String {
    "scc".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    30
}

fn default_stage_timeout_secs() -> u64 {
    60
}

impl FetchConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn clone_timeout(&self) -> Duration {
        Duration::from_secs(self.clone_timeout_secs)
    }
}

impl AnalysisConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./clocbot.toml
    /// 3. ./clocbot.json
    /// 4. ./clocbot.yaml
    /// 5. ./clocbot.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if path.exists() {
                return Self::load_from_path(path);
            }
            log::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let candidates = ["clocbot.toml", "clocbot.json", "clocbot.yaml", "clocbot.yml"];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Directory clones are written under.
    ///
    /// Falls back to the platform cache directory, then to `./_data`.
    pub fn data_root(&self) -> PathBuf {
        self.data_root.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .map(|dir| dir.join("clocbot").join("clones"))
                .unwrap_or_else(|| PathBuf::from("_data"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fetch.git_program, "git");
        assert_eq!(config.fetch.clone_timeout(), Duration::from_secs(60));
        assert_eq!(config.fetch.probe_timeout(), Duration::from_secs(30));
        assert_eq!(config.analysis.program, "scc");
        assert!(config.analysis.args.is_empty());
        assert_eq!(config.analysis.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
data-root = "/var/lib/clocbot"

[fetch]
clone-timeout-secs = 300

[analysis]
program = "/usr/local/bin/scc"
args = ["--no-cocomo"]
timeout-secs = 180
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.data_root(), PathBuf::from("/var/lib/clocbot"));
        assert_eq!(config.fetch.clone_timeout_secs, 300);
        assert_eq!(config.fetch.git_program, "git");
        assert_eq!(config.analysis.program, "/usr/local/bin/scc");
        assert_eq!(config.analysis.args, vec!["--no-cocomo".to_string()]);
        assert_eq!(config.analysis.timeout_secs, 180);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "fetch": {
    "git-program": "/opt/git/bin/git",
    "probe-timeout-secs": 5
  }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.fetch.git_program, "/opt/git/bin/git");
        assert_eq!(config.fetch.probe_timeout_secs, 5);
        assert_eq!(config.fetch.clone_timeout_secs, 60);
        assert!(config.data_root.is_none());
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yml").unwrap();
        write!(temp_file, "analysis:\n  timeout-secs: 15\n").unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.analysis.timeout_secs, 15);
        assert_eq!(config.analysis.program, "scc");
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load(Some(Path::new("nonexistent.toml"))).unwrap();
        assert_eq!(config.fetch.clone_timeout_secs, 60);
        assert_eq!(config.analysis.program, "scc");
    }

    #[test]
    fn test_load_invalid_config_reports_path() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[fetch\nclone-timeout-secs = ").unwrap();

        let err = Config::load_from_path(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse TOML config"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("clocbot.toml");

        let mut config = Config::default();
        config.data_root = Some(PathBuf::from("/tmp/clones"));
        config.analysis.args = vec!["--no-complexity".to_string()];
        config.save(&path).unwrap();

        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded.data_root, Some(PathBuf::from("/tmp/clones")));
        assert_eq!(reloaded.analysis.args, vec!["--no-complexity".to_string()]);
        assert_eq!(reloaded.fetch.git_program, "git");
    }
}
