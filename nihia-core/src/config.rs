use std::path::PathBuf;

use serde::Deserialize;

use nihia_proto::Sensitivity;

use crate::engine::EngineSettings;
use crate::state::HANDSHAKE_RETRY_LIMIT;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    device: DeviceConfig,
    #[serde(default)]
    knobs: KnobConfig,
    #[serde(default)]
    connect: ConnectConfig,
}

#[derive(Deserialize, Default)]
struct DeviceConfig {
    extra_port_suffixes: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
struct KnobConfig {
    coarse_divisor: Option<f64>,
    fine_divisor: Option<f64>,
}

#[derive(Deserialize, Default)]
struct ConnectConfig {
    handshake_retries: Option<u32>,
}

pub struct Config {
    device: DeviceConfig,
    knobs: KnobConfig,
    connect: ConnectConfig,
}

impl Config {
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => merge(&mut base, user),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            device: base.device,
            knobs: base.knobs,
            connect: base.connect,
        }
    }

    /// Extra DAW-port suffixes to scan for, beyond the built-in list.
    pub fn extra_port_suffixes(&self) -> Vec<String> {
        self.device.extra_port_suffixes.clone().unwrap_or_default()
    }

    /// Knob divisors, clamped away from zero so a bad config cannot turn a
    /// detent into an infinite step.
    pub fn sensitivity(&self) -> Sensitivity {
        let fallback = Sensitivity::default();
        Sensitivity {
            coarse: self.knobs.coarse_divisor.unwrap_or(fallback.coarse).max(1.0),
            fine: self.knobs.fine_divisor.unwrap_or(fallback.fine).max(1.0),
        }
    }

    pub fn handshake_retries(&self) -> u32 {
        self.connect
            .handshake_retries
            .unwrap_or(HANDSHAKE_RETRY_LIMIT)
            .clamp(1, 600)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            sensitivity: self.sensitivity(),
            handshake_retries: self.handshake_retries(),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nihia").join("config.toml"))
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    if user.device.extra_port_suffixes.is_some() {
        base.device.extra_port_suffixes = user.device.extra_port_suffixes;
    }
    if user.knobs.coarse_divisor.is_some() {
        base.knobs.coarse_divisor = user.knobs.coarse_divisor;
    }
    if user.knobs.fine_divisor.is_some() {
        base.knobs.fine_divisor = user.knobs.fine_divisor;
    }
    if user.connect.handshake_retries.is_some() {
        base.connect.handshake_retries = user.connect.handshake_retries;
    }
}
