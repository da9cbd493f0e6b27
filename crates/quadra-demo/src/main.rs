//! Quadra demo: a 5x5 grid of spinning sprites under a rotating triangle fan,
//! animated from background threads.
//!
//! Usage: `quadra-demo [TEXTURE] [--single]`
//! - `TEXTURE`: image used as the default sprite texture (fallback if missing)
//! - `--single`: draw one quad driven by the global transform instead of the grid

mod app;
mod producers;

use quadra_engine::logging::{init_logging, LoggingConfig};
use quadra_engine::window::{Runtime, RuntimeConfig};
use quadra_engine::{GpuInit, RenderMode, RendererConfig, SceneRenderer};

use app::DemoApp;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let mut config = RendererConfig::default();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--single" => config.mode = RenderMode::SingleQuad,
            path => config.default_texture = Some(path.into()),
        }
    }
    log::info!("starting demo: {:?}", config);

    let app = DemoApp::new(SceneRenderer::new(config));
    Runtime::run(
        RuntimeConfig {
            title: "quadra demo".to_string(),
            ..RuntimeConfig::default()
        },
        GpuInit::default(),
        app,
    )
}
