use super::router::RouteHandler;
use crate::{
    error::{Result, StatelessBlindsError},
    host::OnCharacteristic,
};
use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};
use std::sync::Arc;
use tracing::*;

/// Accepts true/false, on/off and 1/0 in any case, or a JSON boolean
pub fn parse_switch_payload(content: &[u8]) -> Result<bool> {
    let text = std::str::from_utf8(content)
        .map_err(|_| StatelessBlindsError::InvalidSwitchPayload(format!("{:?}", content)))?
        .trim();
    match text.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => serde_json::from_str::<bool>(text)
            .map_err(|_| StatelessBlindsError::InvalidSwitchPayload(text.to_owned())),
    }
}

pub fn format_switch_state(state: bool) -> &'static str {
    if state {
        "true"
    } else {
        "false"
    }
}

pub struct SetSwitchHandler {
    handler: Arc<dyn OnCharacteristic>,
}

impl SetSwitchHandler {
    pub fn new(handler: Arc<dyn OnCharacteristic>) -> Box<Self> {
        Box::new(Self { handler })
    }
}

#[async_trait]
impl RouteHandler for SetSwitchHandler {
    #[instrument(skip(self, content))]
    async fn call(&mut self, topic: &str, content: &[u8]) -> anyhow::Result<()> {
        match parse_switch_payload(content) {
            Ok(value) => {
                info!("mqtt set switch {}", value);
                self.handler.set(value);
            }
            Err(e) => {
                error!("Ignoring switch command {}", e);
            }
        }
        Ok(())
    }
}

pub struct GetSwitchHandler {
    handler: Arc<dyn OnCharacteristic>,
    client: AsyncClient,
    state_topic: String,
}

impl GetSwitchHandler {
    pub fn new(
        handler: Arc<dyn OnCharacteristic>,
        client: AsyncClient,
        state_topic: String,
    ) -> Box<Self> {
        Box::new(Self {
            handler,
            client,
            state_topic,
        })
    }
}

#[async_trait]
impl RouteHandler for GetSwitchHandler {
    #[instrument(skip(self, _content))]
    async fn call(&mut self, topic: &str, _content: &[u8]) -> anyhow::Result<()> {
        let state = self.handler.get();
        debug!("mqtt get switch {}", state);
        self.client
            .publish(
                &self.state_topic,
                QoS::AtMostOnce,
                false,
                format_switch_state(state),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSwitch {
        values: Mutex<Vec<bool>>,
    }

    impl OnCharacteristic for RecordingSwitch {
        fn get(&self) -> bool {
            false
        }

        fn set(&self, value: bool) {
            self.values.lock().unwrap().push(value);
        }
    }

    #[test]
    fn parses_switch_payloads() {
        assert!(parse_switch_payload(b"true").unwrap());
        assert!(parse_switch_payload(b" ON\n").unwrap());
        assert!(parse_switch_payload(b"1").unwrap());
        assert!(!parse_switch_payload(b"False").unwrap());
        assert!(!parse_switch_payload(b"off").unwrap());
        assert!(!parse_switch_payload(b"0").unwrap());
    }

    #[test]
    fn rejects_unknown_payloads() {
        assert!(matches!(
            parse_switch_payload(b"maybe"),
            Err(StatelessBlindsError::InvalidSwitchPayload(_))
        ));
        assert!(parse_switch_payload(&[0xff, 0xfe]).is_err());
    }

    #[tokio::test]
    async fn set_handler_forwards_parsed_value() {
        let switch = Arc::new(RecordingSwitch::default());
        let mut handler = SetSwitchHandler::new(switch.clone());

        handler.call("blinds/up/set", b"on").await.unwrap();
        handler.call("blinds/up/set", b"garbage").await.unwrap();
        handler.call("blinds/up/set", b"off").await.unwrap();

        assert_eq!(*switch.values.lock().unwrap(), vec![true, false]);
    }
}
