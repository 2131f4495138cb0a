use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{window, CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent};

use super::{dom, render};
use crate::config::FieldConfig;
use crate::field::{Bounds, ParticleField};

/// Particle field on a 2D canvas context.
pub fn start(canvas: HtmlCanvasElement, config: FieldConfig, seed: u64) -> Result<(), JsValue> {
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or("2D canvas not supported")?
        .dyn_into()?;

    let field = Rc::new(RefCell::new(ParticleField::<Vec2>::new(config, seed)));
    let (w, h) = render::fit_canvas(&canvas)?;
    field.borrow_mut().resize(Bounds::viewport(w, h));
    log::info!("particle field {}x{}", w, h);

    let win = window().ok_or("no window")?;
    {
        let field = field.clone();
        dom::listen(&win, "resize", move |_| match render::fit_canvas(&canvas) {
            Ok((w, h)) => field.borrow_mut().resize(Bounds::viewport(w, h)),
            Err(err) => log::warn!("resize failed: {:?}", err),
        })?;
    }
    bind_pointer(&win, field.clone())?;

    render::animate(move |_| {
        field.borrow_mut().step();
        if let Err(err) = draw(&ctx, &field.borrow()) {
            log::warn!("draw failed: {:?}", err);
        }
    })
}

/// Pointer move sets, leaving the window clears.
pub fn bind_pointer(
    win: &web_sys::Window,
    field: Rc<RefCell<ParticleField<Vec2>>>,
) -> Result<(), JsValue> {
    {
        let field = field.clone();
        dom::listen(win, "mousemove", move |e| {
            if let Some(e) = e.dyn_ref::<MouseEvent>() {
                field
                    .borrow_mut()
                    .set_pointer(Vec2::new(e.client_x() as f32, e.client_y() as f32));
            }
        })?;
    }
    dom::listen(win, "mouseout", move |e| {
        let left = e
            .dyn_ref::<MouseEvent>()
            .is_some_and(|e| e.related_target().is_none());
        if left {
            field.borrow_mut().clear_pointer();
        }
    })
}

fn draw(ctx: &CanvasRenderingContext2d, field: &ParticleField<Vec2>) -> Result<(), JsValue> {
    let Some(bounds) = field.bounds() else {
        return Ok(());
    };
    ctx.clear_rect(0.0, 0.0, bounds.max.x as f64, bounds.max.y as f64);

    let particles = field.particles();
    for p in particles {
        ctx.begin_path();
        ctx.arc(p.position.x as f64, p.position.y as f64, p.radius as f64, 0.0, TAU)?;
        ctx.set_fill_style_str(&p.color.to_string());
        ctx.fill();
    }

    let config = field.config();
    ctx.set_line_width(1.0);
    for link in field.connections() {
        let (a, b) = (particles[link.a].position, particles[link.b].position);
        ctx.set_stroke_style_str(&config.link_color.css_rgba(link.strength * config.link_alpha));
        line(ctx, a, b);
    }

    if config.pointer_links {
        if let Some(at) = field.pointer() {
            for (i, strength) in field.pointer_links() {
                ctx.set_stroke_style_str(
                    &config
                        .pointer_link_color
                        .css_rgba(strength * config.pointer_link_alpha),
                );
                line(ctx, at, particles[i].position);
            }
        }
    }
    Ok(())
}

fn line(ctx: &CanvasRenderingContext2d, a: Vec2, b: Vec2) {
    ctx.begin_path();
    ctx.move_to(a.x as f64, a.y as f64);
    ctx.line_to(b.x as f64, b.y as f64);
    ctx.stroke();
}
