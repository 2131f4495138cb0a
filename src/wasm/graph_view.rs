use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{window, CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

use super::{dom, render};
use crate::config::GraphConfig;
use crate::graph::NodeGraph;

/// Node graph projected onto a 2D canvas. Returns the shared graph so the
/// page can toggle the activity boost.
pub fn start(
    canvas: HtmlCanvasElement,
    config: GraphConfig,
    seed: u64,
) -> Result<Rc<RefCell<NodeGraph>>, JsValue> {
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or("2D canvas not supported")?
        .dyn_into()?;

    let graph = Rc::new(RefCell::new(NodeGraph::new(config, seed)));
    let size = Rc::new(RefCell::new(render::fit_canvas(&canvas)?));

    let win = window().ok_or("no window")?;
    {
        let size = size.clone();
        dom::listen(&win, "resize", move |_| match render::fit_canvas(&canvas) {
            Ok(s) => *size.borrow_mut() = s,
            Err(err) => log::warn!("resize failed: {:?}", err),
        })?;
    }
    {
        let graph = graph.clone();
        let size = size.clone();
        dom::listen(&win, "mousemove", move |e| {
            let Some(e) = e.dyn_ref::<MouseEvent>() else {
                return;
            };
            let (w, h) = *size.borrow();
            if w > 0.0 && h > 0.0 {
                let offset = Vec2::new(
                    e.client_x() as f32 / w * 2.0 - 1.0,
                    -(e.client_y() as f32 / h * 2.0 - 1.0),
                );
                graph.borrow_mut().set_pointer_offset(offset);
            }
        })?;
    }
    {
        let graph = graph.clone();
        dom::listen(&win, "mouseout", move |e| {
            if e.dyn_ref::<MouseEvent>().is_some_and(|e| e.related_target().is_none()) {
                graph.borrow_mut().clear_pointer_offset();
            }
        })?;
    }

    let shared = graph.clone();
    render::animate(move |_| {
        graph.borrow_mut().step();
        let (w, h) = *size.borrow();
        if let Err(err) = draw(&ctx, &graph.borrow(), w, h) {
            log::warn!("draw failed: {:?}", err);
        }
    })?;
    Ok(shared)
}

fn draw(ctx: &CanvasRenderingContext2d, graph: &NodeGraph, w: f32, h: f32) -> Result<(), JsValue> {
    ctx.clear_rect(0.0, 0.0, w as f64, h as f64);
    if w <= 0.0 || h <= 0.0 {
        return Ok(());
    }
    let projected = graph.project(w, h);
    let alpha = graph.field().config().link_alpha;

    ctx.set_line_width(1.0);
    let edge = graph.edge_color();
    for link in graph.edges() {
        let (a, b) = (projected[link.a], projected[link.b]);
        if !(a.visible && b.visible) {
            continue;
        }
        ctx.set_stroke_style_str(&edge.css_rgba(link.strength * alpha));
        ctx.begin_path();
        ctx.move_to(a.screen.x as f64, a.screen.y as f64);
        ctx.line_to(b.screen.x as f64, b.screen.y as f64);
        ctx.stroke();
    }

    ctx.set_fill_style_str(&graph.node_color().to_string());
    let nodes = graph.field().particles();
    for ((node, spin), at) in nodes.iter().zip(graph.spins()).zip(&projected) {
        if !at.visible {
            continue;
        }
        let half = (node.radius * at.scale) as f64;
        ctx.save();
        ctx.translate(at.screen.x as f64, at.screen.y as f64)?;
        ctx.rotate(*spin as f64)?;
        ctx.fill_rect(-half, -half, half * 2.0, half * 2.0);
        ctx.restore();
    }
    Ok(())
}
