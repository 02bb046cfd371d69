pub mod mqtt_server;
pub mod router;
pub mod routes;

pub use mqtt_server::{start_mqtt_service, MqttServiceRegistry};
