//! Run configuration
//!
//! A plain JSON file mapping input and output locations per platform.
//! Any output directory left unset skips that emission stage with a
//! warning rather than failing the run.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use tablec_core::Platform;

/// Output locations for one compilation target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Where `.pbmeta` schema files go
    pub schema_dir: Option<PathBuf>,
    /// Where protoc-generated source goes
    pub codegen_dir: Option<PathBuf>,
    /// Where `.pbdata` blobs go
    pub data_dir: Option<PathBuf>,
    /// Where generated accessor classes go
    pub accessor_dir: Option<PathBuf>,
    /// Error-code constants for the engine layer
    pub error_code_frame_dir: Option<PathBuf>,
    /// Error-code constants for game logic
    pub error_code_business_dir: Option<PathBuf>,
}

impl TargetConfig {
    /// Every configured output directory of this target
    pub fn output_dirs(&self) -> Vec<&Path> {
        [
            &self.schema_dir,
            &self.codegen_dir,
            &self.data_dir,
            &self.accessor_dir,
            &self.error_code_frame_dir,
            &self.error_code_business_dir,
        ]
        .into_iter()
        .filter_map(|dir| dir.as_deref())
        .collect()
    }
}

/// An external program run before or after a compile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory searched recursively for `.xlsx` files
    pub input_root: PathBuf,
    /// Enable client outputs
    pub client: Option<TargetConfig>,
    /// Enable server outputs
    pub server: Option<TargetConfig>,
    /// Package line written into every emitted schema file
    pub proto_package: String,
    /// Path to the protoc binary; unset skips code generation
    pub protoc_path: Option<PathBuf>,
    pub pre_hook: Option<HookConfig>,
    pub post_hook: Option<HookConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_root: PathBuf::new(),
            client: None,
            server: None,
            proto_package: default_package(),
            protoc_path: None,
            pre_hook: None,
            post_hook: None,
        }
    }
}

fn default_package() -> String {
    "business.data.tables".to_string()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// The output config for a platform, if that platform is enabled
    pub fn target(&self, platform: Platform) -> Option<&TargetConfig> {
        match platform {
            Platform::Client => self.client.as_ref(),
            Platform::Server => self.server.as_ref(),
        }
    }

    /// The platforms this run emits for
    pub fn enabled_platforms(&self) -> Vec<Platform> {
        let mut platforms = Vec::new();
        if self.client.is_some() {
            platforms.push(Platform::Client);
        }
        if self.server.is_some() {
            platforms.push(Platform::Server);
        }
        platforms
    }
}
