mod core;
mod exchange;
mod gui;
mod player;

use eframe::egui;
use gui::MediaTaggerApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_title("Media Tagger"),
        ..Default::default()
    };

    eframe::run_native(
        "Media Tagger",
        options,
        Box::new(|cc| match MediaTaggerApp::new(cc) {
            Ok(app) => Ok(Box::new(app)),
            Err(e) => {
                eprintln!("Failed to initialize app: {}", e);
                std::process::exit(1);
            }
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
