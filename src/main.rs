use std::process::ExitCode;

use eframe::egui;
use glam::UVec2;

use paintgl::app::PaintApp;
use paintgl::cli;
use paintgl::logger;
use paintgl::session::PaintSession;
use paintgl::settings::AppSettings;

fn main() -> ExitCode {
    logger::init();
    let settings = AppSettings::load();

    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        return cli::run(args, &settings);
    }

    // -- GUI mode -----------------------------------------------------
    let initial = UVec2::new(1280, 720);
    let session = match PaintSession::new(&settings, initial) {
        Ok(session) => session,
        Err(e) => {
            log::error!("could not start paint session: {e}");
            eprintln!("error: {e}");
            if let Some(path) = logger::log_path() {
                eprintln!("details in {}", path.display());
            }
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "started with a {}x{} canvas, {} rendering",
        settings.canvas_width,
        settings.canvas_height,
        session.backend().name()
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([initial.x as f32, initial.y as f32])
            .with_min_inner_size([320.0, 240.0])
            .with_title("PaintGL"),
        ..Default::default()
    };

    match eframe::run_native(
        "PaintGL",
        options,
        Box::new(move |cc| Box::new(PaintApp::new(cc, session, settings))),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("window loop failed: {e}");
            ExitCode::FAILURE
        }
    }
}
