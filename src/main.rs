#![warn(clippy::all, rust_2018_idioms)]

use annotation_overlay::OverlayApp;
use log::{error, info};

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    // Optional image to annotate instead of the screen
    let image = std::env::args().nth(1).and_then(|path| match image::open(&path) {
        Ok(image) => {
            info!("Opened {path}");
            Some(image.to_rgba8())
        }
        Err(e) => {
            error!("Failed to open {path}: {e}");
            None
        }
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Annotation Overlay",
        native_options,
        Box::new(|cc| Ok(Box::new(OverlayApp::new(cc, image)))),
    )
}
