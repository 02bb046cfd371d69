use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// This method panics in case it fails to set the global subscriber
pub fn setup_tracing(verbosity_level: u8, json: bool) {
    let filter = match verbosity_level {
        0 => tracing::level_filters::LevelFilter::INFO,
        1 => tracing::level_filters::LevelFilter::DEBUG,
        _ => tracing::level_filters::LevelFilter::TRACE,
    };

    let stderr_writer = (!json).then(|| {
        fmt::Layer::default()
            .with_thread_names(true)
            .with_writer(std::io::stderr)
    });

    let json_writer = json.then(|| {
        fmt::Layer::default()
            .json()
            .with_thread_names(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_list(true)
            .with_writer(std::io::stderr)
    });

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(filter.into()))
        .with(stderr_writer)
        .with(json_writer);

    tracing::subscriber::set_global_default(subscriber).expect("unable to set global subscriber");
}
