#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

pub mod api;
pub mod color;
pub mod config;
pub mod error;
pub mod field;
pub mod graph;
pub mod pattern;
pub mod session;
pub mod shader;

pub use config::{AppConfig, Repulsion, Variant};
pub use error::{ClientError, ClientResult};
pub use field::{Bounds, Link, Particle, ParticleField};
pub use graph::NodeGraph;
pub use session::{RequestKind, Session};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    use wasm_bindgen::prelude::*;

    use crate::config::AppConfig;

    mod app;
    mod backdrop;
    mod canvas2d;
    mod dom;
    mod graph_view;
    mod http;
    mod render;
    mod webgl;

    const CANVAS_ID: &str = "bgCanvas";
    const CONFIG_ID: &str = "qpgen-config";

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let raw = document
            .get_element_by_id(CONFIG_ID)
            .and_then(|el| el.text_content())
            .unwrap_or_default();
        let config = AppConfig::from_json(&raw).map_err(|e| JsValue::from_str(&e.to_string()))?;
        console_log::init_with_level(config.log_level()).ok();
        log::info!("starting {:?} background", config.variant);

        let canvas = document
            .get_element_by_id(CANVAS_ID)
            .ok_or("canvas not found")?
            .dyn_into::<web_sys::HtmlCanvasElement>()?;

        let backdrop = backdrop::start(canvas, &config).map_err(|e| {
            log::error!("background failed to start: {:?}", e);
            e
        })?;
        app::bind(&document, config, backdrop)?;
        Ok(())
    }
}

// When compiling for non-wasm targets (e.g., `cargo test` on host),
// provide an empty stub so the crate still builds.
#[cfg(not(target_arch = "wasm32"))]
pub fn main() {}
