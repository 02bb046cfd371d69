pub mod accessory;
pub mod command;
pub mod configuration;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod logging;
pub mod mqtt;
