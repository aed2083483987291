pub mod adjust;
pub mod clock;
pub mod config;
pub mod controller;
pub mod editor;
pub mod error;
pub mod paths;
pub mod program;
pub mod run_state;
pub mod runner;
pub mod source;
pub mod time;

pub use adjust::adjust_duration;
pub use clock::{active_index_at, resolve_active_section, section_start_times, ActiveSectionView};
pub use config::{
    ClockConfig, LoggingConfig, ProgramConfig, SmartcountConfig, CONFIG_TEMPLATE,
};
pub use controller::{
    ClockEvent, Command, CountdownController, NudgeDirection, DEFAULT_ADJUST_STEP_SECONDS,
};
pub use editor::{active_index_after_delete, add_section, delete_section};
pub use error::{CoreError, Result};
pub use paths::{
    config_dir, config_path, log_dir, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
    CONFIG_PATH_ENV, LOG_FILE_NAME,
};
pub use program::{Program, Section, DEFAULT_PROGRAM_TITLE};
pub use run_state::RunState;
pub use runner::{ClockRunner, CommandSender, DEFAULT_TICK_INTERVAL_MS};
pub use source::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use time::{format_hms, SecondsExt};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
