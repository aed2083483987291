use crate::controller::DEFAULT_ADJUST_STEP_SECONDS;
use crate::error::{CoreError, Result};
use crate::program::{Program, Section, DEFAULT_PROGRAM_TITLE};
use crate::runner::DEFAULT_TICK_INTERVAL_MS;
use const_format::formatcp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmartcountConfig {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub program: ProgramConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Re-evaluation period in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Size of one interactive nudge in seconds
    #[serde(default = "default_adjust_step")]
    pub adjust_step_seconds: u64,
}

const fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

const fn default_adjust_step() -> u64 {
    DEFAULT_ADJUST_STEP_SECONDS
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            adjust_step_seconds: default_adjust_step(),
        }
    }
}

/// The program restored on startup and on every restart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConfig {
    #[serde(default = "default_program_title")]
    pub title: String,
    #[serde(default = "default_sections")]
    pub sections: Vec<Section>,
}

fn default_program_title() -> String {
    DEFAULT_PROGRAM_TITLE.to_string()
}

fn default_sections() -> Vec<Section> {
    Program::default().sections().to_vec()
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            title: default_program_title(),
            sections: default_sections(),
        }
    }
}

impl ProgramConfig {
    /// Build the program described by this config.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyProgram`] if no sections are configured.
    pub fn to_program(&self) -> Result<Program> {
        Program::new(self.title.clone(), self.sections.clone())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file in the cache directory
    #[serde(default)]
    pub enabled: bool,
}

impl SmartcountConfig {
    /// Get the configuration directory path (~/.config/smartcount/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (`SMARTCOUNT_CONFIG` or ~/.config/smartcount/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing a template if no
    /// config existed, or an error if the file cannot be read, parsed or
    /// validated.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        Self::load_from(&config_path)
    }

    /// Load and validate config from a specific file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config from a TOML string
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigParseError`] for malformed TOML and
    /// [`CoreError::ConfigInvalid`] for values out of range.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.clock.tick_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "clock.tick_interval_ms must be greater than zero".into(),
            });
        }
        if self.clock.adjust_step_seconds == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "clock.adjust_step_seconds must be greater than zero".into(),
            });
        }
        if self.program.sections.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "program.sections must contain at least one section".into(),
            });
        }
        if let Some(pos) = self
            .program
            .sections
            .iter()
            .position(|s| s.title.trim().is_empty())
        {
            return Err(CoreError::ConfigInvalid {
                message: format!("program.sections[{pos}].title must not be empty"),
            });
        }
        Ok(())
    }
}

/// Config template written on first run
pub const CONFIG_TEMPLATE: &str = formatcp!(
    r#"# Smartcount Configuration
# ~/.config/smartcount/config.toml

[clock]
# How often the active section is re-evaluated
tick_interval_ms = {tick}
# Seconds added or removed by the "+" and "-" commands
adjust_step_seconds = {step}

[program]
title = "{title}"

[[program.sections]]
title = "Discuss the problem"
seconds = 120
presenters = []

[[program.sections]]
title = "Discuss possible solutions"
seconds = 120
presenters = []

[[program.sections]]
title = "Make a plan"
seconds = 120
presenters = []

[logging]
# Also write logs to the cache directory
enabled = false
"#,
    tick = DEFAULT_TICK_INTERVAL_MS,
    step = DEFAULT_ADJUST_STEP_SECONDS,
    title = DEFAULT_PROGRAM_TITLE,
);
