// =============================================================================
// PENGUIN PHYSICAL ENGINE - Vulkan bootstrap
// =============================================================================
//
// Opens a window, creates a Vulkan instance, picks a GPU, and creates a
// logical device with one graphics queue. Then it waits for the window to be
// closed and tears everything down again.
//
// ARCHITECTURE OVERVIEW:
// ┌─────────────────────────────────────────────────────────────────┐
// │  main (config, logging, exit code)                              │
// │    └── engine::launch (stage-by-stage bootstrap, event loop)    │
// │          ├── window::WinitShim   (winit + ash-window)           │
// │          └── backend::VulkanApi  (ash)                          │
// └─────────────────────────────────────────────────────────────────┘
//
// =============================================================================

mod backend;
mod config;
mod engine;
mod error;
mod window;

use backend::VulkanApi;
use config::Config;
use engine::Lifecycle;
use error::BootstrapError;
use window::WinitShim;

fn main() {
    // Load configuration from config.toml
    let (config, notices) = Config::load();

    init_logging(&config);
    for notice in &notices {
        notice.emit();
    }
    log::info!("Starting {}", config.application.name);
    log::info!(
        "Window: {}x{} ({})",
        config.window.width,
        config.window.height,
        if config.window.resizable { "resizable" } else { "fixed size" }
    );

    let mut lifecycle = Lifecycle::new();
    let result = run(&config, &mut lifecycle);
    if let Err(ref e) = result {
        log::error!("Runtime Error: {}", e);
    }
    log::debug!("Stages: {:?}", lifecycle.history());

    // Every resource is released by the time `run` returns
    std::process::exit(engine::exit_code(&result));
}

fn run(config: &Config, lifecycle: &mut Lifecycle) -> Result<(), BootstrapError> {
    let api = VulkanApi::load().map_err(|e| lifecycle.abort(e))?;
    engine::launch(WinitShim::new, &api, config, lifecycle)?;
    log::info!("Clean shutdown");
    Ok(())
}

/// Initialize logging. RUST_LOG still overrides the configured level.
fn init_logging(config: &Config) {
    use env_logger::{Builder, Env};

    let mut builder = Builder::new();
    builder.filter_level(config.log_level());
    builder.parse_env(Env::default());
    builder.init();
}
