//! Thin DOM helpers used by the page glue and the background renderers.

use js_sys::Promise;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, Document, Element, Event, EventTarget, FileReader, HtmlInputElement};

/// Attach `handler` for the lifetime of the page.
pub fn listen<F>(target: &EventTarget, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

pub fn by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("#{id} not found")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("#{id} has the wrong element type")))
}

pub fn set_hidden(el: &Element, hidden: bool) {
    let classes = el.class_list();
    let res = if hidden {
        classes.add_1("hidden")
    } else {
        classes.remove_1("hidden")
    };
    if let Err(err) = res {
        log::warn!("could not toggle visibility: {:?}", err);
    }
}

/// Blocking notification, the one channel errors reach the user through.
pub fn alert(message: &str) {
    if let Some(w) = web_sys::window() {
        if w.alert_with_message(message).is_err() {
            log::warn!("alert blocked: {message}");
        }
    }
}

pub fn input_value(document: &Document, id: &str) -> Result<String, JsValue> {
    Ok(by_id::<HtmlInputElement>(document, id)?.value())
}

/// Read a file or blob into a `data:` URL.
pub async fn read_data_url(blob: &Blob) -> Result<String, JsValue> {
    let reader = FileReader::new()?;
    let loaded = Promise::new(&mut |resolve, reject| {
        let done = reader.clone();
        let onload = Closure::once_into_js(move || {
            let result = done.result().unwrap_or(JsValue::NULL);
            if let Err(err) = resolve.call1(&JsValue::NULL, &result) {
                log::warn!("file read resolve: {:?}", err);
            }
        });
        let onerror = Closure::once_into_js(move || {
            let err = JsValue::from_str("could not read the selected file");
            if let Err(err) = reject.call1(&JsValue::NULL, &err) {
                log::warn!("file read reject: {:?}", err);
            }
        });
        reader.set_onload(Some(onload.unchecked_ref()));
        reader.set_onerror(Some(onerror.unchecked_ref()));
    });
    reader.read_as_data_url(blob)?;
    JsFuture::from(loaded)
        .await?
        .as_string()
        .ok_or_else(|| JsValue::from_str("file did not read as a data URL"))
}

/// Error text for a rejected JS call.
pub fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}
