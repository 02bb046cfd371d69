use crate::{
    command::Direction,
    dispatcher::CommandDispatcher,
    host::{AccessoryInformation, OnCharacteristic, ServiceId, ServiceRegistry},
};
use std::sync::Arc;
use tracing::*;

/// Handler bound to the "On" characteristic of one switch.
///
/// Reads always report the configured initial state, the host owns the live toggle.
pub struct SwitchHandler {
    direction: Direction,
    active: bool,
    dispatcher: CommandDispatcher,
}

impl SwitchHandler {
    pub fn new(direction: Direction, dispatcher: CommandDispatcher) -> Self {
        let active = dispatcher.config().switch(direction).active;
        Self {
            direction,
            active,
            dispatcher,
        }
    }
}

impl OnCharacteristic for SwitchHandler {
    fn get(&self) -> bool {
        self.active
    }

    fn set(&self, value: bool) {
        let command = self.direction.command_for(value);
        debug!("{} switch set to {}, sending {}", self.direction, value, command);
        // fire and forget
        let _ = self.dispatcher.dispatch(command);
    }
}

pub struct StatelessBlindAccessory {
    information_service: ServiceId,
    up_service: ServiceId,
    down_service: ServiceId,
    up: Arc<SwitchHandler>,
    down: Arc<SwitchHandler>,
}

impl StatelessBlindAccessory {
    pub fn new(dispatcher: CommandDispatcher, registry: &mut impl ServiceRegistry) -> Self {
        let up_name = dispatcher.config().switch_display_name(Direction::Up);
        let down_name = dispatcher.config().switch_display_name(Direction::Down);

        let up_service = registry.create_switch(&up_name, Direction::Up.subtype());
        let down_service = registry.create_switch(&down_name, Direction::Down.subtype());

        registry.set_name(up_service, &up_name);
        registry.set_name(down_service, &down_name);

        let up = Arc::new(SwitchHandler::new(Direction::Up, dispatcher.clone()));
        let down = Arc::new(SwitchHandler::new(Direction::Down, dispatcher));

        registry.bind_on_characteristic(up_service, up.clone());
        registry.bind_on_characteristic(down_service, down.clone());

        let information_service =
            registry.create_information_service(AccessoryInformation::default());

        info!("Registered accessory with switches {:?} and {:?}", up_name, down_name);

        Self {
            information_service,
            up_service,
            down_service,
            up,
            down,
        }
    }

    /// Services exposed to the host, information first
    pub fn services(&self) -> [ServiceId; 3] {
        [
            self.information_service,
            self.down_service,
            self.up_service,
        ]
    }

    fn handler(&self, direction: Direction) -> &SwitchHandler {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    pub fn get_state(&self, direction: Direction) -> bool {
        self.handler(direction).get()
    }

    pub fn set_state(&self, direction: Direction, value: bool) {
        self.handler(direction).set(value)
    }
}
