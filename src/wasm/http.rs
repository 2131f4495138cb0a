//! `fetch` wrappers returning [`ClientError`] instead of raw `JsValue`s.

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, FormData, Request, RequestInit, Response};

use super::dom;
use crate::api::{decode_reply, ServiceReply};
use crate::error::{ClientError, ClientResult};

fn transport(err: JsValue) -> ClientError {
    ClientError::Transport(dom::describe(&err))
}

async fn send(url: &str, body: &JsValue, json: bool) -> ClientResult<Response> {
    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_body(body);
    let request = Request::new_with_str_and_init(url, &opts).map_err(transport)?;
    if json {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(transport)?;
    }
    let window = web_sys::window().ok_or_else(|| ClientError::Transport("no window".into()))?;
    let resp = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(transport)?;
    resp.dyn_into::<Response>()
        .map_err(|_| ClientError::Decode("fetch did not return a Response".into()))
}

async fn text(resp: &Response) -> ClientResult<String> {
    let body = JsFuture::from(resp.text().map_err(transport)?)
        .await
        .map_err(transport)?;
    body.as_string()
        .ok_or_else(|| ClientError::Decode("body is not text".into()))
}

pub async fn post_form<T>(url: &str, form: &FormData) -> ClientResult<T>
where
    T: DeserializeOwned + ServiceReply,
{
    let body: &JsValue = form.as_ref();
    let resp = send(url, body, false).await?;
    decode_reply(resp.status(), &text(&resp).await?)
}

pub async fn post_json<B, T>(url: &str, body: &B) -> ClientResult<T>
where
    B: Serialize,
    T: DeserializeOwned + ServiceReply,
{
    let payload = serde_json::to_string(body)?;
    let resp = send(url, &JsValue::from_str(&payload), true).await?;
    decode_reply(resp.status(), &text(&resp).await?)
}

/// POST JSON and return the binary body; any non-2xx status is an error.
pub async fn post_json_for_blob<B: Serialize>(url: &str, body: &B) -> ClientResult<Blob> {
    let payload = serde_json::to_string(body)?;
    let resp = send(url, &JsValue::from_str(&payload), true).await?;
    if !resp.ok() {
        return Err(ClientError::Status(resp.status()));
    }
    JsFuture::from(resp.blob().map_err(transport)?)
        .await
        .map_err(transport)?
        .dyn_into::<Blob>()
        .map_err(|_| ClientError::Decode("body is not a blob".into()))
}
