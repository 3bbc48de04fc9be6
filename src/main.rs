mod app;
mod application;
mod config;
mod domain;
mod extractor;
mod ui;
mod utils;

use iced::{window, Size};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::AppConfig;

fn main() -> iced::Result {
    let config = AppConfig::from_env();
    init_logging(&config.log_filter);

    tracing::info!(
        extractor = %config.extractor_command.join(" "),
        download_dir = %config.download_dir.display(),
        "starting"
    );

    iced::application(
        move || app::DownloadApp::new(config.clone()),
        app::update,
        app::view,
    )
    .title("YouTube Video Downloader")
    .window(window::Settings {
        size: Size::new(600.0, 500.0),
        ..Default::default()
    })
    .run()
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).compact())
        .init();
}
