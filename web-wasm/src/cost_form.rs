//! コストフォームへの取り付け
//!
//! フォーム自体はサーバー描画。ここでは送信時の整合チェック、
//! 編集モーダルへの値の流し込み、請求書抽出による自動入力を配線する。

use crate::api::extraction::FetchTransport;
use crate::dom::{console_error, document, element_by_id, set_control_value, set_visible, control_value};
use gloo::timers::callback::Timeout;
use label_forms_common::autofill::{
    EXTRACTING_LABEL, EXTRACT_LABEL, HIGHLIGHT_CLASS, HIGHLIGHT_DURATION,
};
use label_forms_common::cost::edit_action_url;
use label_forms_common::html::escape_html;
use label_forms_common::{
    AutofillClient, AutofillView, CostData, CostForm, ExtractionTransport, SelectedFile,
    SubmitDecision, TargetField,
};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{Element, Event, File, HtmlButtonElement, HtmlFormElement, HtmlInputElement};

/// Bootstrapモーダルが閉じたときのイベント
const MODAL_HIDDEN_EVENT: &str = "hidden.bs.modal";

/// フォーム要素のID
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldIds {
    pub cost_type: String,
    pub description: String,
    pub incurred_on: String,
    pub net_amount: String,
    pub vat_rate: String,
    pub vat_amount: String,
    pub gross_amount: String,
    pub document_reference: String,
}

impl Default for FieldIds {
    fn default() -> Self {
        Self {
            cost_type: "costType".into(),
            description: "description".into(),
            incurred_on: TargetField::IncurredOn.default_id().into(),
            net_amount: TargetField::NetAmount.default_id().into(),
            vat_rate: TargetField::VatRate.default_id().into(),
            vat_amount: TargetField::VatAmount.default_id().into(),
            gross_amount: TargetField::GrossAmount.default_id().into(),
            document_reference: TargetField::DocumentReference.default_id().into(),
        }
    }
}

impl FieldIds {
    pub fn target(&self, target: TargetField) -> &str {
        match target {
            TargetField::VatRate => &self.vat_rate,
            TargetField::NetAmount => &self.net_amount,
            TargetField::VatAmount => &self.vat_amount,
            TargetField::GrossAmount => &self.gross_amount,
            TargetField::IncurredOn => &self.incurred_on,
            TargetField::DocumentReference => &self.document_reference,
        }
    }
}

/// `mount_cost_form` の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostFormConfig {
    pub form_id: String,
    pub error_container_id: String,
    #[serde(default)]
    pub field_ids: FieldIds,
    /// 抽出を使う場合のファイル入力
    #[serde(default)]
    pub file_input_id: Option<String>,
    #[serde(default)]
    pub extract_button_id: Option<String>,
    #[serde(default)]
    pub csrf_token: String,
    /// 編集モーダルとして使う場合
    #[serde(default)]
    pub edit: Option<EditConfig>,
}

/// 編集ボタンの設定
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditConfig {
    /// `{costId}` を含む送信先URL
    pub action_url_template: String,
    pub button_selector: String,
    /// 閉じたときにエラー表示を消すモーダル
    #[serde(default)]
    pub modal_id: Option<String>,
}

pub fn attach(config: CostFormConfig) -> Result<(), JsValue> {
    let form: HtmlFormElement = element_by_id(&config.form_id)?.dyn_into()?;
    let errors = element_by_id(&config.error_container_id)?;

    attach_validation(&form, errors.clone(), config.field_ids.clone());

    if let Some(edit) = &config.edit {
        attach_edit_buttons(&form, &errors, edit, &config.field_ids)?;
    }

    if let (Some(file_input_id), Some(button_id)) = (&config.file_input_id, &config.extract_button_id) {
        let input: HtmlInputElement = element_by_id(file_input_id)?.dyn_into()?;
        let button: HtmlButtonElement = element_by_id(button_id)?.dyn_into()?;
        attach_autofill(input, button, config.field_ids, config.csrf_token)?;
    }

    Ok(())
}

/// 現在の入力値を読む（無い欄は空文字）
fn read_form(ids: &FieldIds) -> CostForm {
    let value = |id: &str| {
        element_by_id(id)
            .ok()
            .and_then(|el| control_value(&el))
            .unwrap_or_default()
    };
    CostForm {
        cost_type: value(&ids.cost_type),
        description: value(&ids.description),
        incurred_on: value(&ids.incurred_on),
        net_amount: value(&ids.net_amount),
        vat_amount: value(&ids.vat_amount),
        vat_rate: value(&ids.vat_rate),
        gross_amount: value(&ids.gross_amount),
        document_reference: value(&ids.document_reference),
    }
}

fn write_form(ids: &FieldIds, form: &CostForm) {
    let pairs = [
        (&ids.cost_type, &form.cost_type),
        (&ids.description, &form.description),
        (&ids.incurred_on, &form.incurred_on),
        (&ids.net_amount, &form.net_amount),
        (&ids.vat_amount, &form.vat_amount),
        (&ids.vat_rate, &form.vat_rate),
        (&ids.gross_amount, &form.gross_amount),
        (&ids.document_reference, &form.document_reference),
    ];
    for (id, value) in pairs {
        if let Ok(el) = element_by_id(id) {
            set_control_value(&el, value);
        }
    }
}

fn show_errors(container: &Element, errors: &[String]) {
    let html = errors
        .iter()
        .map(|e| escape_html(e))
        .collect::<Vec<_>>()
        .join("<br>");
    container.set_inner_html(&html);
    set_visible(container, true);
}

/// 送信時に整合チェックし、不一致なら送信を止めて一覧表示
fn attach_validation(form: &HtmlFormElement, errors: Element, ids: FieldIds) {
    let closure = Closure::wrap(Box::new(move |ev: Event| {
        match read_form(&ids).on_submit() {
            SubmitDecision::Block(messages) => {
                ev.prevent_default();
                show_errors(&errors, &messages);
            }
            SubmitDecision::Proceed => set_visible(&errors, false),
        }
    }) as Box<dyn FnMut(_)>);

    let _ = form.add_event_listener_with_callback("submit", closure.as_ref().unchecked_ref());
    closure.forget();
}

/// 編集ボタンの data 属性から既存コストを流し込む
///
/// 前に開いたコストのエラー表示は、編集開始時とモーダルを閉じたときに消す。
fn attach_edit_buttons(
    form: &HtmlFormElement,
    errors: &Element,
    edit: &EditConfig,
    ids: &FieldIds,
) -> Result<(), JsValue> {
    if let Some(modal_id) = &edit.modal_id {
        let modal = element_by_id(modal_id)?;
        let errors = errors.clone();
        let on_hidden = Closure::wrap(Box::new(move |_: Event| {
            set_visible(&errors, false);
        }) as Box<dyn FnMut(_)>);
        modal.add_event_listener_with_callback(MODAL_HIDDEN_EVENT, on_hidden.as_ref().unchecked_ref())?;
        on_hidden.forget();
    }

    let buttons = document()?.query_selector_all(&edit.button_selector)?;

    for i in 0..buttons.length() {
        let Some(button) = buttons.get(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };

        let form = form.clone();
        let template = edit.action_url_template.clone();
        let ids = ids.clone();
        let errors = errors.clone();
        let source = button.clone();
        let closure = Closure::wrap(Box::new(move |_: Event| {
            set_visible(&errors, false);
            let data = cost_data(&source);
            form.set_action(&edit_action_url(&template, data.cost_id.as_deref().unwrap_or_default()));

            let mut values = CostForm::default();
            values.populate(&data);
            write_form(&ids, &values);
        }) as Box<dyn FnMut(_)>);

        button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    Ok(())
}

fn cost_data(button: &Element) -> CostData {
    let data = |name: &str| button.get_attribute(&format!("data-{}", name));
    CostData {
        cost_id: data("cost-id"),
        cost_type: data("cost-type"),
        description: data("description"),
        incurred_on: data("incurred-on"),
        net_amount: data("net-amount"),
        vat_amount: data("vat-amount"),
        vat_rate: data("vat-rate"),
        gross_amount: data("gross-amount"),
        document_reference: data("document-reference"),
    }
}

/// DOM上のフォームに対する自動入力ビュー
#[derive(Clone)]
struct DomAutofillView {
    ids: FieldIds,
    button: HtmlButtonElement,
}

impl DomAutofillView {
    fn field(&self, target: TargetField) -> Option<Element> {
        element_by_id(self.ids.target(target)).ok()
    }
}

impl AutofillView for DomAutofillView {
    fn set_field(&mut self, target: TargetField, value: &str) {
        if let Some(el) = self.field(target) {
            set_control_value(&el, value);
        }
    }

    fn has_rate_option(&self, value: &str) -> bool {
        self.field(TargetField::VatRate)
            .and_then(|select| {
                select
                    .query_selector(&format!(r#"option[value="{}"]"#, value))
                    .ok()
                    .flatten()
            })
            .is_some()
    }

    fn highlight(&mut self, target: TargetField) {
        let Some(el) = self.field(target) else { return };
        let _ = el.class_list().add_1(HIGHLIGHT_CLASS);
        Timeout::new(HIGHLIGHT_DURATION.as_millis() as u32, move || {
            let _ = el.class_list().remove_1(HIGHLIGHT_CLASS);
        })
        .forget();
    }

    fn set_extract_visible(&mut self, visible: bool) {
        set_visible(&self.button, visible);
    }

    fn set_busy(&mut self, busy: bool) {
        self.button.set_disabled(busy);
        if busy {
            self.button.set_inner_html(&format!(
                r#"<span class="spinner-border spinner-border-sm me-1" role="status"></span> {}"#,
                EXTRACTING_LABEL
            ));
        } else {
            self.button.set_inner_html(EXTRACT_LABEL);
        }
    }

    fn log_diagnostic(&mut self, message: &str) {
        console_error(message);
    }
}

fn attach_autofill(
    input: HtmlInputElement,
    button: HtmlButtonElement,
    ids: FieldIds,
    csrf_token: String,
) -> Result<(), JsValue> {
    let view = DomAutofillView { ids, button: button.clone() };
    let client = Rc::new(RefCell::new(AutofillClient::<File>::new(csrf_token)));
    let transport = Rc::new(FetchTransport::default());

    client.borrow().attach(&mut view.clone());

    let on_file_change = {
        let client = Rc::clone(&client);
        let mut view = view.clone();
        let source = input.clone();
        Closure::wrap(Box::new(move |_: Event| {
            let file = source
                .files()
                .and_then(|files| files.get(0))
                .map(|file| SelectedFile::new(file.type_(), file));
            client.borrow_mut().select_file(file, &mut view);
        }) as Box<dyn FnMut(_)>)
    };
    input.add_event_listener_with_callback("change", on_file_change.as_ref().unchecked_ref())?;
    on_file_change.forget();

    let on_extract = Closure::wrap(Box::new(move |ev: Event| {
        ev.prevent_default();

        let mut view = view.clone();
        let pending = client.borrow_mut().begin_extraction(&mut view);
        let Some(pending) = pending else { return };

        let client = Rc::clone(&client);
        let transport = Rc::clone(&transport);
        let csrf_token = client.borrow().csrf_token().to_string();
        // 応答待ちの間は借用を持たない（ファイル変更を受け付けるため）
        wasm_bindgen_futures::spawn_local(async move {
            let response = transport.extract(&pending.document, &csrf_token).await;
            client.borrow_mut().finish_extraction(pending, response, &mut view);
        });
    }) as Box<dyn FnMut(_)>);
    button.add_event_listener_with_callback("click", on_extract.as_ref().unchecked_ref())?;
    on_extract.forget();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_ids_default_to_target_ids() {
        let ids = FieldIds::default();
        for target in TargetField::ALL {
            assert_eq!(ids.target(target), target.default_id());
        }
    }

    #[test]
    fn test_config_from_page_json() {
        let config: CostFormConfig = serde_json::from_str(
            r#"{
                "formId": "editCostForm",
                "errorContainerId": "editCostErrors",
                "fieldIds": {"netAmount": "editNetAmount", "vatRate": "editVatRate"},
                "edit": {
                    "actionUrlTemplate": "/costs/{costId}",
                    "buttonSelector": ".edit-cost-btn",
                    "modalId": "editCostModal"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.field_ids.target(TargetField::NetAmount), "editNetAmount");
        assert_eq!(config.field_ids.target(TargetField::GrossAmount), "grossAmount");
        assert!(config.file_input_id.is_none());
        let edit = config.edit.unwrap();
        assert_eq!(edit.button_selector, ".edit-cost-btn");
        assert_eq!(edit.modal_id.as_deref(), Some("editCostModal"));
    }
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use crate::dom::{has_class, HIDDEN_CLASS};
    use web_sys::HtmlElement;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// テスト用の要素をbodyに追加
    fn fixture(html: &str) -> Element {
        let document = document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_inner_html(html);
        document.body().unwrap().append_child(&root).unwrap();
        root
    }

    fn autofill_view(prefix: &str) -> (Element, DomAutofillView) {
        let root = fixture(&format!(
            concat!(
                r#"<input id="{p}Net"><input id="{p}Gross">"#,
                r#"<select id="{p}Rate"><option value="0.00">0%</option><option value="0.21">21%</option></select>"#,
                r#"<button id="{p}Extract" type="button">Extract</button>"#
            ),
            p = prefix
        ));
        let ids = FieldIds {
            net_amount: format!("{}Net", prefix),
            gross_amount: format!("{}Gross", prefix),
            vat_rate: format!("{}Rate", prefix),
            ..Default::default()
        };
        let button = element_by_id(&format!("{}Extract", prefix))
            .unwrap()
            .dyn_into::<HtmlButtonElement>()
            .unwrap();
        (root, DomAutofillView { ids, button })
    }

    #[wasm_bindgen_test]
    fn wasm_busy_state_disables_button_and_swaps_label() {
        let (root, mut view) = autofill_view("busy");

        view.set_busy(true);
        assert!(view.button.disabled());
        assert!(view.button.inner_html().contains(EXTRACTING_LABEL));
        assert!(view.button.inner_html().contains("spinner-border"));

        view.set_busy(false);
        assert!(!view.button.disabled());
        assert_eq!(view.button.inner_html(), EXTRACT_LABEL);

        root.remove();
    }

    #[wasm_bindgen_test]
    fn wasm_autofill_writes_and_highlights_fields() {
        let (root, mut view) = autofill_view("fill");

        view.set_field(TargetField::NetAmount, "100");
        view.highlight(TargetField::NetAmount);

        let net = element_by_id("fillNet").unwrap();
        assert_eq!(control_value(&net).as_deref(), Some("100"));
        assert!(has_class(&net, HIGHLIGHT_CLASS));
        assert!(!has_class(&element_by_id("fillGross").unwrap(), HIGHLIGHT_CLASS));

        root.remove();
    }

    #[wasm_bindgen_test]
    fn wasm_rate_option_lookup_uses_select_options() {
        let (root, mut view) = autofill_view("rate");

        assert!(view.has_rate_option("0.21"));
        assert!(!view.has_rate_option("0.09"));

        view.set_extract_visible(false);
        assert!(has_class(&view.button, HIDDEN_CLASS));
        view.set_extract_visible(true);
        assert!(!has_class(&view.button, HIDDEN_CLASS));

        root.remove();
    }

    #[wasm_bindgen_test]
    fn wasm_edit_button_fills_form_and_clears_previous_errors() {
        let root = fixture(concat!(
            r#"<div id="editModal"><form id="editForm" action="/costs">"#,
            r#"<input id="editNet"><input id="editRef"></form>"#,
            r#"<div id="editErrors">VAT amount (25.00) should be 21.00</div></div>"#,
            r#"<button type="button" class="edit-cost-test" data-cost-id="42" "#,
            r#"data-net-amount="80.50" data-document-reference="INV-9">Edit</button>"#
        ));
        let form = element_by_id("editForm").unwrap().dyn_into::<HtmlFormElement>().unwrap();
        let errors = element_by_id("editErrors").unwrap();
        let ids = FieldIds {
            net_amount: "editNet".into(),
            document_reference: "editRef".into(),
            ..Default::default()
        };
        let edit = EditConfig {
            action_url_template: "/costs/{costId}".into(),
            button_selector: ".edit-cost-test".into(),
            modal_id: Some("editModal".into()),
        };
        attach_edit_buttons(&form, &errors, &edit, &ids).unwrap();

        root.query_selector(".edit-cost-test")
            .unwrap()
            .unwrap()
            .dyn_into::<HtmlElement>()
            .unwrap()
            .click();

        assert!(has_class(&errors, HIDDEN_CLASS));
        assert!(form.action().ends_with("/costs/42"));
        assert_eq!(control_value(&element_by_id("editNet").unwrap()).as_deref(), Some("80.50"));
        assert_eq!(control_value(&element_by_id("editRef").unwrap()).as_deref(), Some("INV-9"));

        // 再表示されたエラーもモーダルを閉じれば消える
        set_visible(&errors, true);
        let hidden = Event::new(MODAL_HIDDEN_EVENT).unwrap();
        element_by_id("editModal").unwrap().dispatch_event(&hidden).unwrap();
        assert!(has_class(&errors, HIDDEN_CLASS));

        root.remove();
    }
}
