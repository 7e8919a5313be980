use std::any::Any;
use std::sync::Once;

use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, Registry};

/// When dropped, flushes remaining spans/events to disk/network etc
pub type Guards = Vec<Box<dyn Any + Send>>;

#[must_use]
pub fn setup_logging() -> Result<Guards, anyhow::Error> {
    let (appender, appender_guard) = tracing_appender::non_blocking(std::io::stdout());

    let drops: Guards = vec![Box::new(appender_guard)];

    let env_filter = tracing_subscriber::EnvFilter::from_default_env();

    let fmt_layer = fmt::Layer::new()
        .with_writer(appender)
        .pretty()
        .with_thread_ids(true);

    let subscriber = Registry::default()
        .with(ErrorLayer::default())
        .with(env_filter)
        .with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber).unwrap_or_else(|e| {
        eprintln!("Error setting the global tracing subscriber: {:?}", e);
    });
    color_eyre::install().unwrap_or_else(|e| {
        eprintln!("Couldn't set up color_eyre: {:?}", e);
    });

    Ok(drops)
}

static TEST_LOGGING: Once = Once::new();

/// Logging for tests, captured by the test harness. Safe to call repeatedly.
pub fn setup_test_logging() {
    TEST_LOGGING.call_once(|| {
        use tracing_subscriber::FmtSubscriber;
        let subscriber = FmtSubscriber::builder()
            .pretty()
            .with_writer(fmt::TestWriter::new())
            .with_env_filter(
                tracing_subscriber::EnvFilter::from_default_env()
                    .add_directive("paxos=debug".parse().unwrap()),
            )
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Couldn't set up default tracing subscriber");
    });
}
