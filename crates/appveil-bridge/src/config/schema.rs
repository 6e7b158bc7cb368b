use std::path::PathBuf;

use serde::Deserialize;

use appveil_core::error::{AppVeilError, Result};

use crate::sync::ConsumerSignal;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub version: u32,

    /// Package id of the authoring app; left out of pickers.
    #[serde(default)]
    pub self_package: Option<String>,

    pub storage: StorageSection,

    #[serde(default)]
    pub consumer: ConsumerSection,

    #[serde(default)]
    pub diagnostics: DiagnosticsSection,
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AppVeilError::UnsupportedVersion);
        }
        if self.storage.local_dir.as_os_str().is_empty() {
            return Err(AppVeilError::BadConfig("storage.local_dir must not be empty".into()));
        }

        self.consumer.validate(&self.storage)?;
        self.diagnostics.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    pub local_dir: PathBuf,
}

/// Consumer activation signal as written by the detection mechanism.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerSection {
    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub protocol_version: u32,

    #[serde(default)]
    pub storage_dir: PathBuf,

    #[serde(default)]
    pub min_protocol_version: u32,
}

impl ConsumerSection {
    pub fn validate(&self, storage: &StorageSection) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        if self.storage_dir.as_os_str().is_empty() {
            return Err(AppVeilError::BadConfig(
                "consumer.storage_dir is required when consumer.active is true".into(),
            ));
        }
        if self.storage_dir == storage.local_dir {
            return Err(AppVeilError::BadConfig(
                "consumer.storage_dir must differ from storage.local_dir".into(),
            ));
        }
        Ok(())
    }

    pub fn signal(&self) -> ConsumerSignal {
        ConsumerSignal {
            active: self.active,
            protocol_version: self.protocol_version,
            storage_dir: self.storage_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiagnosticsSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl DiagnosticsSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(AppVeilError::BadConfig(format!(
                "diagnostics.listen must be a socket address, got {:?}",
                self.listen
            )));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "127.0.0.1:8787".into()
}
