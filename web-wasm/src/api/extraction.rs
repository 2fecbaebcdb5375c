//! 請求書抽出APIクライアント（fetch + FormData）

use label_forms_common::autofill::{CSRF_HEADER, DOCUMENT_FIELD, EXTRACTION_API_URL};
use label_forms_common::{ExtractionError, ExtractionResult, ExtractionTransport};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FormData, Request, RequestInit, RequestMode, Response};

/// ブラウザの fetch で抽出エンドポイントを呼ぶ
#[derive(Debug, Clone)]
pub struct FetchTransport {
    url: String,
}

impl FetchTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Default for FetchTransport {
    fn default() -> Self {
        Self::new(EXTRACTION_API_URL)
    }
}

impl ExtractionTransport for FetchTransport {
    type Document = File;

    async fn extract(&self, document: &File, csrf_token: &str) -> Result<ExtractionResult, ExtractionError> {
        let resp = post_document(&self.url, document, csrf_token)
            .await
            .map_err(|e| ExtractionError::Network(js_message(&e)))?;

        if !resp.ok() {
            return Err(ExtractionError::Status(resp.status()));
        }

        let json = resp.json().map_err(|e| ExtractionError::Parse(js_message(&e)))?;
        let json = JsFuture::from(json)
            .await
            .map_err(|e| ExtractionError::Parse(js_message(&e)))?;

        serde_wasm_bindgen::from_value(json).map_err(|e| ExtractionError::Parse(e.to_string()))
    }
}

/// multipart で文書を送信
async fn post_document(url: &str, document: &File, csrf_token: &str) -> Result<Response, JsValue> {
    let form = FormData::new()?;
    form.append_with_blob(DOCUMENT_FIELD, document)?;

    let opts = RequestInit::new();
    opts.set_method("POST");
    opts.set_mode(RequestMode::SameOrigin);
    opts.set_body(&form);

    let request = Request::new_with_str_and_init(url, &opts)?;
    request.headers().set(CSRF_HEADER, csrf_token)?;

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window is not available"))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
    resp_value.dyn_into()
}

/// JSエラーを文字列にする
fn js_message(value: &JsValue) -> String {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value))
}
