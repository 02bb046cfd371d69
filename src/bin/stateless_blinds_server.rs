use clap::Parser;
use stateless_blinds::{
    accessory::StatelessBlindAccessory,
    configuration::get_configuration,
    dispatcher::{CommandDispatcher, ReqwestSender},
    host::PLUGIN_IDENTIFIER,
    logging::setup_tracing,
    mqtt::{start_mqtt_service, MqttServiceRegistry},
};
use std::{path::PathBuf, sync::Arc};
use tracing::*;

#[derive(Parser, Debug)]
#[command(
    version,
    author = "David M. Weis <dweis7@gmail.com>",
    about = "Expose stateless blind switches over MQTT and forward them as HTTP requests"
)]
struct Opts {
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log as json
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    setup_tracing(opts.verbose, opts.json_logs);

    let app_config = get_configuration(opts.config)?;

    let dispatcher = CommandDispatcher::new(
        Arc::new(app_config.accessory),
        Arc::new(ReqwestSender::new()),
    );

    let mut registry = MqttServiceRegistry::new(&app_config.mqtt.base_topic);
    let accessory = StatelessBlindAccessory::new(dispatcher, &mut registry);
    info!(
        "{} accessory ready with services {:?}",
        PLUGIN_IDENTIFIER,
        accessory.services()
    );

    let _client = start_mqtt_service(&app_config.mqtt, registry)?;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
