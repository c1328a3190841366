use anyhow::Result;
use eframe::egui;

mod app;
mod core;
mod error;
mod messaging;
mod settings;
mod ui;

fn main() -> Result<()> {
    env_logger::init();
    log::info!("starting virtual piano");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 560.0])
            .with_min_inner_size([900.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Virtual Piano",
        options,
        Box::new(|_cc| {
            let app = app::PianoApp::new();
            log::debug!("piano session created");
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("application error: {}", e))
}
