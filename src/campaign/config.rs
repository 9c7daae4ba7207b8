use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::analysis::AnalysisKind;
use crate::campaign::schema;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read campaign file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("campaign file isn't valid JSON: {0}")]
    Decode(serde_json::Error),
    #[error("campaign file fails schema validation")]
    Validation,
    #[error("valid campaign JSON can't be deserialised: {0}")]
    Deserialisation(serde_json::Error),
}

/// One sweep of assimilation cycles and the runtime context their jobs share.
///
/// Replaces the globals that used to be edited in place at the top of the
/// driver script. A campaign is loaded once, read everywhere, never mutated
/// after the CLI override is applied.
#[derive(Debug, Deserialize)]
pub struct Campaign {
    pub years: Vec<u16>,
    pub months: Vec<u8>,
    pub days: Vec<u8>,
    pub hours: Vec<u8>,
    /// Root of the diagnostic tree; cycles resolve to `<data_root>/rrfs.<YYYYMMDD>/`
    pub data_root: String,
    /// Directory holding the di_*.py analysis programs
    pub scripts_dir: String,
    pub analysis: AnalysisKind,
    /// Opaque domain-filter expression, forwarded verbatim ("True" = no filtering)
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default)]
    pub save_detail: bool,
    /// Job-name prefix; job names are `<job_tag>_<cycle id>`
    #[serde(default = "default_job_tag")]
    pub job_tag: String,
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_sbatch")]
    pub sbatch: String,
    /// Environment modules loaded on the compute node, in order
    #[serde(default)]
    pub modules: Vec<String>,
    /// Conda environment activated after the module loads
    #[serde(default)]
    pub conda_env: Option<String>,
    pub resources: Resources,
}

/// Static per-job resource requests declared in the #SBATCH header
#[derive(Debug, Deserialize)]
pub struct Resources {
    #[serde(default = "default_time")]
    pub time: String,
    #[serde(default = "default_memory")]
    pub memory: String,
    pub account: String,
    pub partition: String,
}

fn default_domain() -> String {
    "True".to_string()
}

fn default_job_tag() -> String {
    "pygsi".to_string()
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_sbatch() -> String {
    "sbatch".to_string()
}

fn default_time() -> String {
    "01:00:00".to_string()
}

fn default_memory() -> String {
    "16G".to_string()
}

impl Campaign {
    /// Read a campaign file: parse untyped, validate against the bundled
    /// schema, then deserialise into the typed struct.
    pub fn load(path: &Path) -> Result<Campaign, ConfigError> {
        let json = parse_untyped_json(path)?;
        match validate(&json) {
            Ok(_) => {
                info!("Campaign file is valid");
                parse_json(json)
            }
            Err(err) => {
                warn!("Campaign file fails validation");
                Err(err)
            }
        }
    }
}

fn parse_untyped_json(path: &Path) -> Result<Value, ConfigError> {
    info!("Reading campaign at {}", path.display());
    let json_string = fs::read_to_string(path).map_err(|source| {
        warn!("Can't read campaign file at path {}: {}", path.display(), source);
        ConfigError::Read { path: path.to_path_buf(), source }
    })?;
    serde_json::from_str::<Value>(&json_string).map_err(ConfigError::Decode)
}

fn validate(json: &Value) -> Result<(), ConfigError> {
    info!("Validating campaign against JSON schema");
    let compiled_schema = schema::load_schema();
    let result = match compiled_schema.validate(json) {
        Ok(_) => Ok(()),
        Err(errors) => {
            for error in errors {
                warn!("Schema violation at {}: {}", error.instance_path, error);
            }
            Err(ConfigError::Validation)
        }
    };
    result
}

fn parse_json(value: Value) -> Result<Campaign, ConfigError> {
    info!("Deserialising valid JSON into typed campaign");
    serde_json::from_value::<Campaign>(value).map_err(ConfigError::Deserialisation)
}
