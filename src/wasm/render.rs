use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{window, HtmlCanvasElement};

/// Drive `frame` once per display refresh, forever. The callback receives the
/// `requestAnimationFrame` timestamp in milliseconds.
pub fn animate<F>(mut frame: F) -> Result<(), JsValue>
where
    F: FnMut(f64) + 'static,
{
    // `f` holds the animation-frame closure so that we can keep calling
    // `request_animation_frame` recursively. Storing it inside an `Option`
    // allows us to create the `Closure` first and then obtain a reference to
    // it from within itself.
    let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |now: f64| {
        frame(now);

        // schedule next
        if let Err(err) = request_frame(&f) {
            log::error!("animation stopped: {:?}", err);
        }
    }) as Box<dyn FnMut(f64)>));

    request_frame(&g)
}

fn request_frame(slot: &Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>) -> Result<(), JsValue> {
    let slot = slot.borrow();
    let cb = slot.as_ref().ok_or("animation closure missing")?;
    window()
        .ok_or("no window")?
        .request_animation_frame(cb.as_ref().unchecked_ref())?;
    Ok(())
}

/// Window inner size in CSS pixels.
pub fn window_size() -> Result<(f64, f64), JsValue> {
    let w = window().ok_or("no window")?;
    let width = w.inner_width()?.as_f64().ok_or("inner_width not a number")?;
    let height = w.inner_height()?.as_f64().ok_or("inner_height not a number")?;
    Ok((width, height))
}

/// Resize the canvas drawing buffer to the window and return the new size.
pub fn fit_canvas(canvas: &HtmlCanvasElement) -> Result<(f32, f32), JsValue> {
    let (w, h) = window_size()?;
    canvas.set_width(w as u32);
    canvas.set_height(h as u32);
    Ok((w as f32, h as f32))
}
