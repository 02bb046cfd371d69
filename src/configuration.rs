use crate::{
    command::{Command, Direction},
    error::Result,
};
use secrecy::Secret;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::*;

const DEFAULT_CONFIGURATION_PATH: &str = "configuration/settings.yaml";

/// Use default config if no path is provided
///
/// The accessory section is read straight from the yaml file because `config`
/// lowercases keys, which would rewrite request bodies. Broker settings go
/// through `config` so they can be overridden from the environment.
pub fn get_configuration(config: Option<PathBuf>) -> Result<AppConfig> {
    let (path, settings) = if let Some(config) = config {
        info!("Using configuration from {:?}", config);
        let settings = config::Config::builder().add_source(config::File::from(config.as_path()));
        (config, settings)
    } else {
        info!("Using default configuration");
        let path = PathBuf::from(DEFAULT_CONFIGURATION_PATH);
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_path()))
            .add_source(config::File::with_name("configuration/dev_settings").required(false));
        (path, settings)
    };

    let settings = settings
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;

    Ok(AppConfig {
        accessory: read_accessory_config(&path)?,
        mqtt: settings.get("mqtt")?,
    })
}

#[derive(Deserialize)]
struct AccessorySection {
    accessory: AccessoryConfig,
}

pub fn read_accessory_config(path: &Path) -> Result<AccessoryConfig> {
    let contents = std::fs::read_to_string(path)?;
    parse_accessory_config(&contents)
}

pub fn parse_accessory_config(yaml: &str) -> Result<AccessoryConfig> {
    let section: AccessorySection = serde_yaml::from_str(yaml)?;
    Ok(section.accessory)
}

#[derive(Debug)]
pub struct AppConfig {
    pub accessory: AccessoryConfig,
    pub mqtt: MqttConfig,
}

#[derive(Deserialize, Debug)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub base_topic: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<Secret<String>>,
}

/// Per accessory settings. Every command has exactly one request.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AccessoryConfig {
    pub name: String,
    pub up: SwitchConfig,
    pub down: SwitchConfig,
    pub stop: StopConfig,
}

impl AccessoryConfig {
    pub fn request(&self, command: Command) -> &RequestSpec {
        match command {
            Command::Up => &self.up.request,
            Command::Down => &self.down.request,
            Command::Stop => &self.stop.request,
        }
    }

    pub fn switch(&self, direction: Direction) -> &SwitchConfig {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    /// Name shown by the host, e.g. "Living Room Up"
    pub fn switch_display_name(&self, direction: Direction) -> String {
        format!("{} {}", self.name, self.switch(direction).name)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SwitchConfig {
    pub name: String,
    pub active: bool,
    pub request: RequestSpec,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct StopConfig {
    pub request: RequestSpec,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    /// milliseconds
    #[serde(default)]
    pub delay: Option<u64>,
}

impl RequestSpec {
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Zero behaves the same as no delay
    pub fn delay(&self) -> Option<Duration> {
        self.delay
            .filter(|delay| *delay > 0)
            .map(Duration::from_millis)
    }
}
