use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsValue;
use web_sys::HtmlCanvasElement;

use super::{canvas2d, graph_view, webgl};
use crate::config::{AppConfig, Variant};
use crate::graph::NodeGraph;

/// Handle to the running background. Only the graph variant reacts to
/// request activity; the others ignore it.
#[derive(Clone, Default)]
pub struct Backdrop {
    graph: Option<Rc<RefCell<NodeGraph>>>,
}

impl Backdrop {
    pub fn engage_boost(&self) {
        if let Some(graph) = &self.graph {
            graph.borrow_mut().engage_boost();
        }
    }

    pub fn release_boost(&self) {
        if let Some(graph) = &self.graph {
            graph.borrow_mut().release_boost();
        }
    }
}

pub fn start(canvas: HtmlCanvasElement, config: &AppConfig) -> Result<Backdrop, JsValue> {
    let seed = js_sys::Date::now() as u64;
    match config.variant {
        Variant::Particles => {
            canvas2d::start(canvas, config.field.clone(), seed)?;
            Ok(Backdrop::default())
        }
        Variant::Shader => {
            webgl::start(canvas, config.shader.clone())?;
            Ok(Backdrop::default())
        }
        Variant::Graph => {
            let graph = graph_view::start(canvas, config.graph.clone(), seed)?;
            Ok(Backdrop { graph: Some(graph) })
        }
    }
}
