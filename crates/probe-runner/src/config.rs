use anyhow::{anyhow, Context, Result};
use config::{Config, Environment, File, FileFormat};
use probe_host::HostLimits;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct SuiteConfig {
    #[serde(default)]
    pub engine: HostLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(rename = "case", default)]
    pub cases: Vec<CaseConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// JSON 格式输出
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaseConfig {
    pub name: String,
    /// Compiled contract (`.wasm`, or `.wat` text). Relative paths resolve
    /// against the suite file's directory.
    pub contract: PathBuf,
    #[serde(default = "default_function")]
    pub function: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expect: Option<String>,
    #[serde(default)]
    pub expect_prefix: Option<String>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    #[serde(default = "default_check_heap")]
    pub check_heap: bool,
}

// 默认值函数
fn default_log_level() -> String {
    "info".to_string()
}

fn default_function() -> String {
    "say_hello".to_string()
}

fn default_repeat() -> u32 {
    1
}

fn default_check_heap() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl SuiteConfig {
    /// Loads a suite file, applying `PROBE_*` overrides
    /// (e.g. `PROBE_ENGINE__MAX_EPOCH_TICKS=50`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let source = path
            .to_str()
            .ok_or_else(|| anyhow!("Invalid config path: {:?}", path))?;

        let config = Config::builder()
            .add_source(File::new(source, FileFormat::Toml))
            .add_source(
                Environment::with_prefix("PROBE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read suite {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::finish(config, base)
    }

    /// Parses suite TOML held in memory; relative contract paths resolve
    /// against `base_dir`.
    pub fn from_toml_str(toml: &str, base_dir: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::finish(config, base_dir)
    }

    fn finish(config: Config, base_dir: &Path) -> Result<Self> {
        let mut suite: SuiteConfig = config
            .try_deserialize()
            .context("Invalid suite configuration")?;

        for case in &mut suite.cases {
            if case.contract.is_relative() {
                case.contract = base_dir.join(&case.contract);
            }
        }

        suite.validate()?;
        Ok(suite)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cases.is_empty() {
            return Err(anyhow!("suite defines no [[case]] entries"));
        }

        let mut names = HashSet::new();
        for case in &self.cases {
            if !names.insert(case.name.as_str()) {
                return Err(anyhow!("duplicate case name '{}'", case.name));
            }
            if case.repeat == 0 {
                return Err(anyhow!("case '{}': repeat must be greater than 0", case.name));
            }
            if case.expect.is_some() && case.expect_prefix.is_some() {
                return Err(anyhow!(
                    "case '{}': set either expect or expect_prefix, not both",
                    case.name
                ));
            }
        }

        if self.engine.max_console_bytes == 0 {
            return Err(anyhow!("engine.max_console_bytes must be greater than 0"));
        }
        Ok(())
    }
}
