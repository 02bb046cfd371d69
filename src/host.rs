//! Capabilities the home automation host provides to an accessory.
//!
//! An accessory never talks to a host SDK directly. It asks a [`ServiceRegistry`]
//! to create services and binds handlers to their characteristics, and each host
//! integration supplies its own registry.

use serde::Serialize;
use std::{fmt, sync::Arc};

/// Identifier the accessory registers itself under
pub const PLUGIN_IDENTIFIER: &str = "StatelessBlinds";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ServiceId(pub usize);

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "service-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessoryInformation {
    pub manufacturer: String,
    pub model: String,
    pub version: String,
}

impl Default for AccessoryInformation {
    fn default() -> Self {
        Self {
            manufacturer: String::from("Stateless Blinds Inc"),
            model: String::from("Stateless Blinds"),
            version: String::from("1.0.0"),
        }
    }
}

/// Read and write callbacks for the boolean "On" characteristic of a switch
pub trait OnCharacteristic: Send + Sync {
    fn get(&self) -> bool;
    fn set(&self, value: bool);
}

pub trait ServiceRegistry {
    fn create_information_service(&mut self, information: AccessoryInformation) -> ServiceId;

    /// `subtype` distinguishes several switches belonging to one accessory
    fn create_switch(&mut self, name: &str, subtype: &str) -> ServiceId;

    fn set_name(&mut self, service: ServiceId, name: &str);

    fn bind_on_characteristic(&mut self, service: ServiceId, handler: Arc<dyn OnCharacteristic>);
}
