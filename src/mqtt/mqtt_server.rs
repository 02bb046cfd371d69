use super::{
    router::Router,
    routes::{GetSwitchHandler, SetSwitchHandler},
};
use crate::{
    configuration::MqttConfig,
    host::{AccessoryInformation, OnCharacteristic, ServiceId, ServiceRegistry, PLUGIN_IDENTIFIER},
};
use rumqttc::{AsyncClient, ConnAck, Event, Incoming, MqttOptions, Publish, QoS, SubscribeFilter};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc, time::Duration};
use tokio::sync::mpsc::unbounded_channel;
use tracing::*;

enum MqttUpdate {
    Message(Publish),
    Reconnection(ConnAck),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchDescription {
    pub name: String,
    pub subtype: String,
    pub set_topic: String,
    pub get_topic: String,
    pub state_topic: String,
}

/// Retained on `<base>/info` so clients can discover the accessory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessoryInfoMessage {
    pub identifier: String,
    pub information: Option<AccessoryInformation>,
    pub switches: Vec<SwitchDescription>,
}

struct SwitchService {
    name: String,
    subtype: String,
    handler: Option<Arc<dyn OnCharacteristic>>,
}

/// Collects the services an accessory registers so they can be served over MQTT
pub struct MqttServiceRegistry {
    base_topic: String,
    information: Option<AccessoryInformation>,
    switches: BTreeMap<ServiceId, SwitchService>,
    next_id: usize,
}

impl MqttServiceRegistry {
    pub fn new(base_topic: &str) -> Self {
        Self {
            base_topic: base_topic.trim_end_matches('/').to_owned(),
            information: None,
            switches: BTreeMap::new(),
            next_id: 0,
        }
    }

    fn next_service_id(&mut self) -> ServiceId {
        let id = ServiceId(self.next_id);
        self.next_id += 1;
        id
    }

    fn switch_topic(&self, subtype: &str, suffix: &str) -> String {
        format!("{}/{}/{}", self.base_topic, subtype, suffix)
    }

    pub fn info_topic(&self) -> String {
        format!("{}/info", self.base_topic)
    }

    pub fn info_message(&self) -> AccessoryInfoMessage {
        let switches = self
            .switches
            .values()
            .map(|switch| SwitchDescription {
                name: switch.name.clone(),
                subtype: switch.subtype.clone(),
                set_topic: self.switch_topic(&switch.subtype, "set"),
                get_topic: self.switch_topic(&switch.subtype, "get"),
                state_topic: self.switch_topic(&switch.subtype, "state"),
            })
            .collect();
        AccessoryInfoMessage {
            identifier: PLUGIN_IDENTIFIER.to_owned(),
            information: self.information.clone(),
            switches,
        }
    }

    fn build_router(&self, client: &AsyncClient) -> Router {
        let mut router = Router::default();
        for switch in self.switches.values() {
            let Some(handler) = switch.handler.clone() else {
                warn!("Switch {:?} has no bound characteristic", switch.name);
                continue;
            };
            router.add_handler(
                &self.switch_topic(&switch.subtype, "set"),
                SetSwitchHandler::new(handler.clone()),
            );
            router.add_handler(
                &self.switch_topic(&switch.subtype, "get"),
                GetSwitchHandler::new(
                    handler,
                    client.clone(),
                    self.switch_topic(&switch.subtype, "state"),
                ),
            );
        }
        router
    }
}

impl ServiceRegistry for MqttServiceRegistry {
    fn create_information_service(&mut self, information: AccessoryInformation) -> ServiceId {
        self.information = Some(information);
        self.next_service_id()
    }

    fn create_switch(&mut self, name: &str, subtype: &str) -> ServiceId {
        let id = self.next_service_id();
        self.switches.insert(
            id,
            SwitchService {
                name: name.to_owned(),
                subtype: subtype.to_owned(),
                handler: None,
            },
        );
        id
    }

    fn set_name(&mut self, service: ServiceId, name: &str) {
        match self.switches.get_mut(&service) {
            Some(switch) => switch.name = name.to_owned(),
            None => warn!("Can't name unknown service {}", service),
        }
    }

    fn bind_on_characteristic(&mut self, service: ServiceId, handler: Arc<dyn OnCharacteristic>) {
        match self.switches.get_mut(&service) {
            Some(switch) => switch.handler = Some(handler),
            None => warn!("Can't bind characteristic of unknown service {}", service),
        }
    }
}

async fn subscribe_and_announce(
    client: &AsyncClient,
    router: &Router,
    info_topic: &str,
    info_payload: &[u8],
) -> anyhow::Result<()> {
    let topics = router
        .topics_for_subscription()
        .map(|topic| SubscribeFilter {
            path: topic.to_owned(),
            qos: QoS::AtMostOnce,
        })
        .collect::<Vec<_>>();
    client.subscribe_many(topics).await?;
    client
        .publish(info_topic, QoS::AtLeastOnce, true, info_payload)
        .await?;
    Ok(())
}

pub fn start_mqtt_service(
    mqtt_config: &MqttConfig,
    registry: MqttServiceRegistry,
) -> anyhow::Result<AsyncClient> {
    let mut mqttoptions = MqttOptions::new(
        &mqtt_config.client_id,
        &mqtt_config.broker_host,
        mqtt_config.broker_port,
    );
    info!("Starting MQTT server with options {:?}", mqttoptions);
    mqttoptions.set_keep_alive(Duration::from_secs(5));
    if let Some(username) = &mqtt_config.username {
        let password = mqtt_config
            .password
            .as_ref()
            .map(|password| password.expose_secret().to_owned())
            .unwrap_or_default();
        mqttoptions.set_credentials(username, password);
    }

    let (client, mut eventloop) = AsyncClient::new(mqttoptions, 10);

    info!("MQTT base topic {}", registry.base_topic);

    let info_topic = registry.info_topic();
    let info_payload = serde_json::to_vec(&registry.info_message())?;
    let mut router = registry.build_router(&client);

    let (message_sender, mut message_receiver) = unbounded_channel();

    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(notification) => match notification {
                    Event::Incoming(Incoming::Publish(publish)) => {
                        if let Err(e) = message_sender.send(MqttUpdate::Message(publish)) {
                            error!("Error sending message {}", e);
                        }
                    }
                    Event::Incoming(Incoming::ConnAck(con_ack)) => {
                        if let Err(e) = message_sender.send(MqttUpdate::Reconnection(con_ack)) {
                            error!("Error sending message {}", e);
                        }
                    }
                    _ => (),
                },
                Err(e) => {
                    error!("Error processing eventloop notifications {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    });

    let router_client = client.clone();
    tokio::spawn(async move {
        while let Some(update) = message_receiver.recv().await {
            match update {
                MqttUpdate::Message(message) => {
                    match router
                        .handle_message(&message.topic, &message.payload)
                        .await
                    {
                        Ok(false) => error!("No handler for topic: \"{}\"", &message.topic),
                        Ok(true) => (),
                        Err(e) => error!("Failed running handler with {:?}", e),
                    }
                }
                MqttUpdate::Reconnection(_) => {
                    info!("Connected to broker, subscribing");
                    if let Err(e) =
                        subscribe_and_announce(&router_client, &router, &info_topic, &info_payload)
                            .await
                    {
                        error!("Failed to subscribe {:?}", e);
                    }
                }
            }
        }
    });

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSwitch(bool);

    impl OnCharacteristic for FixedSwitch {
        fn get(&self) -> bool {
            self.0
        }

        fn set(&self, _value: bool) {}
    }

    fn registry() -> MqttServiceRegistry {
        let mut registry = MqttServiceRegistry::new("home/blinds/");
        let up = registry.create_switch("Office Up", "up");
        registry.bind_on_characteristic(up, Arc::new(FixedSwitch(false)));
        registry.create_information_service(AccessoryInformation::default());
        registry
    }

    #[test]
    fn info_message_describes_switch_topics() {
        let registry = registry();
        let info = registry.info_message();

        assert_eq!(registry.info_topic(), "home/blinds/info");
        assert_eq!(info.identifier, "StatelessBlinds");
        assert_eq!(info.information, Some(AccessoryInformation::default()));
        assert_eq!(
            info.switches,
            vec![SwitchDescription {
                name: String::from("Office Up"),
                subtype: String::from("up"),
                set_topic: String::from("home/blinds/up/set"),
                get_topic: String::from("home/blinds/up/get"),
                state_topic: String::from("home/blinds/up/state"),
            }]
        );
    }

    #[test]
    fn set_name_renames_switch() {
        let mut registry = registry();
        registry.set_name(ServiceId(0), "Renamed");
        assert_eq!(registry.info_message().switches[0].name, "Renamed");
    }

    #[tokio::test]
    async fn router_serves_bound_switches() {
        let registry = registry();
        let (client, _eventloop) = AsyncClient::new(MqttOptions::new("test", "localhost", 1883), 10);
        let router = registry.build_router(&client);

        let mut topics: Vec<_> = router.topics_for_subscription().collect();
        topics.sort();
        assert_eq!(topics, vec!["home/blinds/up/get", "home/blinds/up/set"]);
    }
}
