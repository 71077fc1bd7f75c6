//! Global agenda configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarComposer, ProjectionMode};
use crate::constants::{DEFAULT_LOOKAHEAD_DAYS, DEFAULT_MAX_EVENTS_PER_DAY};
use crate::error::{AgendaError, AgendaResult};
use crate::schedule::MaterializationPolicy;
use crate::store::LocalStore;

static DEFAULT_DATA_DIR: &str = "~/agenda";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn is_default_data_dir(p: &PathBuf) -> bool {
    *p == default_data_dir()
}

fn default_max_events_per_day() -> usize {
    DEFAULT_MAX_EVENTS_PER_DAY
}

fn default_lookahead_days() -> i64 {
    DEFAULT_LOOKAHEAD_DAYS
}

/// Configuration at ~/.config/agenda/config.toml, overlaid by `AGENDA_*`
/// environment variables.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AgendaConfig {
    #[serde(default = "default_data_dir", skip_serializing_if = "is_default_data_dir")]
    pub data_dir: PathBuf,

    /// Entries per calendar cell before "+N more"
    #[serde(default = "default_max_events_per_day")]
    pub max_events_per_day: usize,

    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,

    #[serde(default)]
    pub projection: ProjectionMode,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        AgendaConfig {
            data_dir: default_data_dir(),
            max_events_per_day: default_max_events_per_day(),
            lookahead_days: default_lookahead_days(),
            projection: ProjectionMode::default(),
        }
    }
}

impl AgendaConfig {
    pub fn config_path() -> AgendaResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgendaError::Config("Could not determine config directory".into()))?
            .join("agenda");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default path, writing a commented-out config first if
    /// none exists.
    pub fn load() -> AgendaResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> AgendaResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("AGENDA").try_parsing(true))
            .build()
            .map_err(|e| AgendaError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AgendaError::Config(e.to_string()))
    }

    pub fn save_to(&self, path: &Path) -> AgendaResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AgendaError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| AgendaError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> AgendaResult<()> {
        let contents = format!(
            "\
# agenda configuration

# Where rules, appointments and tasks are stored:
# data_dir = \"{}\"

# Entries shown per calendar cell before \"+N more\":
# max_events_per_day = {}

# Days ahead that `agenda sweep` materializes:
# lookahead_days = {}

# Whether rule projections hide already materialized rows
# (\"prefer_materialized\") or are drawn alongside them (\"show_both\"):
# projection = \"prefer_materialized\"
",
            DEFAULT_DATA_DIR, DEFAULT_MAX_EVENTS_PER_DAY, DEFAULT_LOOKAHEAD_DAYS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AgendaError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AgendaError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// Returns the data directory in display-friendly form, keeping `~`.
    pub fn display_path(&self) -> &Path {
        &self.data_dir
    }

    pub fn store(&self) -> LocalStore {
        LocalStore::new(self.data_path())
    }

    pub fn policy(&self) -> MaterializationPolicy {
        MaterializationPolicy::new(self.lookahead_days)
    }

    /// A composer over the local store, using the configured projection mode.
    pub fn composer(&self) -> CalendarComposer {
        let store = std::sync::Arc::new(self.store());
        CalendarComposer::new(store.clone(), store.clone(), store).with_projection(self.projection)
    }
}
