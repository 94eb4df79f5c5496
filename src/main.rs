mod app;
mod config;
mod event;
mod navigation;
mod preview;
mod session;
mod theme;
mod ui;

use app::CanvasChatApp;
use clap::Parser;
use config::{AppConfig, Cli};
use eframe::egui;
use navigation::{ChannelRouter, NavigationBridge};
use preview::PreviewSync;
use session::controller::SessionController;
use session::scheduler::TokioScheduler;
use session::script::{default_seeds, ResponseScript};
use session::store::{FileStore, JsonStore};
use session::PageId;
use std::sync::mpsc;
use theme::Theme;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canvas_chat=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Pages offered by the side menu: home plus every page the script can jump to.
fn known_pages(script: &ResponseScript) -> Vec<PageId> {
    let mut pages = vec![PageId::new("home")];
    for position in 0..script.len() as u64 {
        if let Some(jump) = &script.line(position).jump {
            if !pages.contains(&jump.target) {
                pages.push(jump.target.clone());
            }
        }
    }
    pages
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let workspace = std::env::current_dir()?;
    let config = AppConfig::from_cli(Cli::parse(), &workspace);
    let store = FileStore::open(&config.store_dir)?;
    tracing::info!(store = %store.dir().display(), "session store opened");
    let store = JsonStore::new(store);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .thread_name("canvas-chat-timers")
        .build()?;
    let runtime_handle = runtime.handle().clone();
    let (tx, rx) = mpsc::channel();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Canvas Chat",
        native_options,
        Box::new(move |creation_context| {
            let ctx = creation_context.egui_ctx.clone();
            egui_extras::install_image_loaders(&ctx);
            let theme = Theme::default();
            theme.apply_visuals(&ctx);

            let script = ResponseScript::default();
            let pages = known_pages(&script);
            let scheduler = TokioScheduler::new(runtime_handle, tx.clone()).with_repaint(ctx.clone());
            let (mut controller, start_error) = SessionController::start(
                store,
                script,
                default_seeds(),
                Box::new(scheduler),
                config.reply_delay,
            );
            let reset_error = if config.reset_on_start {
                controller.reset().err()
            } else {
                None
            };

            let bridge = NavigationBridge::new(Box::new(ChannelRouter::new(tx).with_repaint(ctx)));
            let mut app = CanvasChatApp::new(
                rx,
                controller,
                PreviewSync::new(bridge),
                config,
                theme,
                pages,
            );
            for err in start_error.into_iter().chain(reset_error) {
                app.log_diagnostic(err.to_string());
            }

            Ok(Box::new(app))
        }),
    )?;

    drop(runtime);
    Ok(())
}
