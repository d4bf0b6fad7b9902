use crate::api::{HttpDeviceConfigApi, HttpReadingsApi};
use crate::app_config::AppConfig;
use crate::config_sync::ConfigScreen;
use crate::emergency::LogDialer;
use crate::notifications::{Notifier, notification_listener};
use crate::readings_sync::ReadingsScreen;
use crate::screen::ScreenSettings;
use std::sync::Arc;
use tokio::task;
use tracing::info;

mod api;
mod app_config;
mod config_sync;
mod console;
mod debounce;
mod domain;
mod emergency;
mod notifications;
mod readings_sync;
mod resolver;
mod screen;
#[cfg(test)]
mod testing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    info!("✅  Loaded configuration");

    let client = api::new_client(&config)?;
    info!(url = config.api().url(), "✅  Initialized API client");

    let (notifier, notifications) = Notifier::channel();
    task::spawn(notification_listener(notifications));

    let settings = ScreenSettings::from(config.screen());
    let config_screen = ConfigScreen::spawn(Arc::new(HttpDeviceConfigApi::new(client.clone())), notifier.clone(), settings);
    let readings_screen = ReadingsScreen::spawn(Arc::new(HttpReadingsApi::new(client)), notifier, settings);

    let emergency_number = config.emergency().phone_number();
    task::spawn(console::config_listener(config_screen.snapshots()));
    task::spawn(console::readings_listener(readings_screen.snapshots(), emergency_number.to_string()));
    info!("✅  Opened screens");

    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));
    let result = console::run(&config_screen, &readings_screen, &LogDialer, emergency_number).await;

    config_screen.close().await;
    readings_screen.close().await;
    info!("👋 Screens closed");

    Ok(result?)
}
