//! DOM操作ヘルパー

use label_forms_common::{RowKey, SelectionRole};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

/// 非表示用のクラス
pub const HIDDEN_CLASS: &str = "d-none";

pub fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("document is not available"))
}

pub fn element_by_id(id: &str) -> Result<Element, JsValue> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("element #{} not found", id)))
}

pub fn html_element_by_id(id: &str) -> Result<HtmlElement, JsValue> {
    element_by_id(id)?.dyn_into::<HtmlElement>().map_err(JsValue::from)
}

/// ブロッキングのアラート
pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

pub fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

/// イベント発生元の要素
pub fn event_element<T: JsCast>(ev: &T) -> Option<Element> {
    ev.unchecked_ref::<Event>()
        .target()
        .and_then(|t| t.dyn_into::<Element>().ok())
}

/// 要素を含む行のキー（`data-row-key`）
pub fn row_key(element: &Element) -> Option<RowKey> {
    element
        .closest("[data-row-key]")
        .ok()
        .flatten()
        .and_then(|row| row.get_attribute("data-row-key"))
        .and_then(|key| key.parse().ok())
        .map(RowKey)
}

/// 要素の `data-role`、無ければチップ欄から判定
pub fn selection_role(element: &Element) -> Option<SelectionRole> {
    if let Some(role) = element.get_attribute("data-role") {
        return SelectionRole::parse(&role);
    }
    [SelectionRole::Artist, SelectionRole::Remixer]
        .into_iter()
        .find(|role| {
            let selector = format!(".track-{}-tags", role.as_str());
            matches!(element.closest(&selector), Ok(Some(_)))
        })
}

pub fn has_class(element: &Element, class: &str) -> bool {
    element.class_list().contains(class)
}

/// input/select/textarea の値
pub fn control_value(element: &Element) -> Option<String> {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        Some(input.value())
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        Some(select.value())
    } else {
        element.dyn_ref::<HtmlTextAreaElement>().map(|t| t.value())
    }
}

/// input/select/textarea に値を書き込む。書き込めたら true
pub fn set_control_value(element: &Element, value: &str) -> bool {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    } else if let Some(textarea) = element.dyn_ref::<HtmlTextAreaElement>() {
        textarea.set_value(value);
    } else {
        return false;
    }
    true
}

pub fn set_visible(element: &Element, visible: bool) {
    let classes = element.class_list();
    let _ = if visible {
        classes.remove_1(HIDDEN_CLASS)
    } else {
        classes.add_1(HIDDEN_CLASS)
    };
}
