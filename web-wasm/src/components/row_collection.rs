//! 繰り返し行コンポーネント
//!
//! 行はモデルの `to_html()` から描画し、イベントはコンテナで一括して受ける。
//! 追加行ごとの個別配線はしない。

use crate::dom::{alert, control_value, event_element, has_class, row_key, selection_role};
use label_forms_common::naming::field_suffix;
use label_forms_common::{CollectionController, CollectionError, RowEvent, RowFactory, RowKey};
use leptos::logging::warn;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

#[component]
pub fn RowCollection<F>(
    controller: RwSignal<CollectionController<F>>,
    add_button_id: &'static str,
    add_label: &'static str,
) -> impl IntoView
where
    F: RowFactory + Send + Sync + 'static,
{
    view! {
        <div
            class="row-collection"
            inner_html=move || controller.with(|c| c.to_html())
            on:click=move |ev| {
                if let Some(event) = click_event(&ev) {
                    dispatch(controller, event);
                }
            }
            on:change=move |ev| on_change(controller, &ev)
            on:input=move |ev| on_input(controller, &ev)
        ></div>
        <button
            type="button"
            class="btn btn-outline-primary btn-sm"
            id=add_button_id
            on:click=move |_| {
                controller.update(|c| {
                    c.add_row();
                });
            }
        >
            {add_label}
        </button>
    }
}

/// クリックされた要素からイベントを組み立てる
fn click_event<T: JsCast>(ev: &T) -> Option<RowEvent> {
    let target = event_element(ev)?;
    let row = row_key(&target)?;

    if has_class(&target, "remove-track") || has_class(&target, "remove-item") {
        return Some(RowEvent::RemoveClicked { row });
    }
    if let Some(id) = target.get_attribute("data-remove-id") {
        let role = selection_role(&target)?;
        return Some(RowEvent::ChipRemoveClicked { row, role, id });
    }
    if target.tag_name().eq_ignore_ascii_case("button") && target.has_attribute("data-role") {
        let role = selection_role(&target)?;
        return Some(RowEvent::AddSelectedClicked { row, role });
    }
    None
}

/// 選択系は再描画、入力欄はモデルだけ更新（フォーカスを保つ）
fn on_change<F, T>(controller: RwSignal<CollectionController<F>>, ev: &T)
where
    F: RowFactory + Send + Sync + 'static,
    T: JsCast,
{
    let Some(target) = event_element(ev) else { return };
    let Some(row) = row_key(&target) else { return };
    let value = control_value(&target).unwrap_or_default();

    if target.has_attribute("data-role") {
        if let Some(role) = selection_role(&target) {
            dispatch(controller, RowEvent::SelectChanged { row, role, value });
        }
    } else {
        record_input(controller, &target, row, value);
    }
}

fn on_input<F, T>(controller: RwSignal<CollectionController<F>>, ev: &T)
where
    F: RowFactory + Send + Sync + 'static,
    T: JsCast,
{
    let Some(target) = event_element(ev) else { return };
    let Some(row) = row_key(&target) else { return };
    if target.has_attribute("data-role") {
        return;
    }
    let value = control_value(&target).unwrap_or_default();
    record_input(controller, &target, row, value);
}

fn dispatch<F>(controller: RwSignal<CollectionController<F>>, event: RowEvent)
where
    F: RowFactory + Send + Sync + 'static,
{
    if let Some(message) = apply_event(controller, event) {
        alert(message);
    }
}

/// イベントを適用し、削除が拒否されたらアラート文言を返す
fn apply_event<F>(controller: RwSignal<CollectionController<F>>, event: RowEvent) -> Option<&'static str>
where
    F: RowFactory + Send + Sync + 'static,
{
    let error = controller.try_update(|c| c.handle_event(event))?.err()?;
    if error == CollectionError::NotFound {
        warn!("row event for a removed row ignored");
    }
    controller.with_untracked(|c| c.guard_message(&error))
}

fn record_input<F>(
    controller: RwSignal<CollectionController<F>>,
    target: &Element,
    row: RowKey,
    value: String,
) where
    F: RowFactory + Send + Sync + 'static,
{
    let Some(field) = target
        .get_attribute("name")
        .and_then(|n| field_suffix(&n).map(str::to_string))
    else {
        return;
    };
    controller.update_untracked(|c| {
        c.set_field_value(row, &field, value);
    });
}

#[cfg(all(target_arch = "wasm32", test))]
mod wasm_tests {
    use super::*;
    use crate::dom::{document, element_by_id};
    use label_forms_common::collection::FIRST_ROW_MESSAGE;
    use label_forms_common::{Catalog, LineItemKind, LineItemRowFactory, SelectionRole};
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;
    use web_sys::{Event, EventInit, HtmlElement, HtmlSelectElement};

    wasm_bindgen_test_configure!(run_in_browser);

    const CATALOG: &str = r#"{
        "artists": [{"id": 1, "artistName": "Aphex Twin"}, {"id": 2, "artistName": "Burial"}],
        "releases": [{"id": 10, "name": "Untrue"}],
        "formats": ["DIGITAL", "VINYL"]
    }"#;

    fn fixture(id: &str, html: &str) -> Element {
        let document = document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_id(id);
        root.set_inner_html(html);
        document.body().unwrap().append_child(&root).unwrap();
        root
    }

    fn click(element: &Element) {
        element.clone().dyn_into::<HtmlElement>().unwrap().click();
    }

    /// バブリングするイベントを発火
    fn fire(element: &Element, kind: &str) {
        let init = EventInit::new();
        init.set_bubbles(true);
        let event = Event::new_with_event_init_dict(kind, &init).unwrap();
        element.dispatch_event(&event).unwrap();
    }

    /// 再描画のエフェクトが走るまで待つ
    async fn next_tick() {
        let promise = js_sys::Promise::new(&mut |resolve, _| {
            web_sys::window()
                .unwrap()
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0)
                .unwrap();
        });
        JsFuture::from(promise).await.unwrap();
    }

    /// コンテナで受けたクリックから組み立てたイベント
    fn click_event_for(html: &str, selector: &str) -> Option<RowEvent> {
        let root = fixture("clickEventFixture", html);
        let captured = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&captured);
        let listener = Closure::wrap(Box::new(move |ev: Event| {
            *sink.borrow_mut() = click_event(&ev);
        }) as Box<dyn FnMut(_)>);
        root.add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())
            .unwrap();

        click(&root.query_selector(selector).unwrap().unwrap());

        root.remove();
        captured.take()
    }

    #[wasm_bindgen_test]
    fn wasm_click_on_remove_button() {
        let event = click_event_for(
            r#"<div data-row-key="4"><button class="remove-item">Remove</button></div>"#,
            ".remove-item",
        );
        assert_eq!(event, Some(RowEvent::RemoveClicked { row: RowKey(4) }));
    }

    #[wasm_bindgen_test]
    fn wasm_click_on_chip_remove_resolves_role_from_tag_area() {
        let event = click_event_for(
            concat!(
                r#"<div data-row-key="2"><div class="track-remixer-tags">"#,
                r#"<span class="badge">Burial <button type="button" data-remove-id="7"></button></span>"#,
                r#"</div></div>"#
            ),
            "[data-remove-id]",
        );
        assert_eq!(
            event,
            Some(RowEvent::ChipRemoveClicked {
                row: RowKey(2),
                role: SelectionRole::Remixer,
                id: "7".into(),
            })
        );
    }

    #[wasm_bindgen_test]
    fn wasm_click_on_add_button_and_outside_rows() {
        let event = click_event_for(
            r#"<div data-row-key="3"><button type="button" data-role="artist">+</button></div>"#,
            "button",
        );
        assert_eq!(
            event,
            Some(RowEvent::AddSelectedClicked { row: RowKey(3), role: SelectionRole::Artist })
        );

        let outside = click_event_for(r#"<button class="remove-item">Remove</button>"#, "button");
        assert_eq!(outside, None);
    }

    #[wasm_bindgen_test]
    fn wasm_guard_messages_follow_refusal_kind() {
        let catalog = Catalog::from_json(CATALOG).unwrap();
        let controller = RwSignal::new(CollectionController::new(LineItemRowFactory::new(
            LineItemKind::Sale,
            &catalog,
        )));
        let first = controller.with_untracked(|c| c.keys()[0]);

        assert_eq!(
            apply_event(controller, RowEvent::RemoveClicked { row: first }),
            Some("At least one line item is required")
        );

        controller.update(|c| {
            c.add_row();
            c.add_row();
        });
        assert_eq!(
            apply_event(controller, RowEvent::RemoveClicked { row: first }),
            Some(FIRST_ROW_MESSAGE)
        );
        assert_eq!(controller.with_untracked(|c| c.len()), 3);

        assert_eq!(apply_event(controller, RowEvent::RemoveClicked { row: RowKey(999) }), None);
    }

    #[wasm_bindgen_test]
    async fn wasm_sale_form_remove_renumbers_following_rows() {
        let root = fixture("saleItemsFixture", "");
        crate::mount_sale_form(
            "saleItemsFixture",
            CATALOG,
            r#"[{"releaseId": 10, "format": "VINYL", "quantity": 1, "unitPrice": 9.5},
                {"quantity": 2}, {"quantity": 3}]"#,
        )
        .unwrap();

        let rows = root.query_selector_all(".line-item").unwrap();
        assert_eq!(rows.length(), 3);

        // 入力はモデルに残り、再描画後も消えない
        let third = element_by_id("lineItems2.quantity").unwrap();
        crate::dom::set_control_value(&third, "9");
        fire(&third, "input");

        let second: Element = rows.get(1).unwrap().dyn_into().unwrap();
        click(&second.query_selector(".remove-item").unwrap().unwrap());
        next_tick().await;
        next_tick().await;

        assert_eq!(root.query_selector_all(".line-item").unwrap().length(), 2);
        let moved = element_by_id("lineItems1.quantity").unwrap();
        assert_eq!(moved.get_attribute("name").as_deref(), Some("lineItems[1].quantity"));
        assert_eq!(crate::dom::control_value(&moved).as_deref(), Some("9"));
        assert!(element_by_id("lineItems2.quantity").is_err());

        let numbers: Vec<String> = (0..2)
            .filter_map(|i| root.query_selector_all(".item-number").unwrap().get(i))
            .filter_map(|n| n.text_content())
            .collect();
        assert_eq!(numbers, vec!["1".to_string(), "2".to_string()]);

        root.remove();
    }

    #[wasm_bindgen_test]
    async fn wasm_track_select_change_and_chip_remove() {
        let root = fixture("trackListFixture", "");
        crate::mount_track_list("trackListFixture", CATALOG, "[]", "[]").unwrap();

        let select: HtmlSelectElement = root
            .query_selector(".track-remixer-select")
            .unwrap()
            .unwrap()
            .dyn_into()
            .unwrap();
        select.set_value("2");
        fire(&select, "change");
        next_tick().await;
        next_tick().await;

        let hidden = r#".track-remixer-inputs input[name="tracks[0].remixerIds"][value="2"]"#;
        assert!(root.query_selector(hidden).unwrap().is_some());

        click(&root
            .query_selector(r#".track-remixer-tags [data-remove-id="2"]"#)
            .unwrap()
            .unwrap());
        next_tick().await;
        next_tick().await;

        assert!(root.query_selector(hidden).unwrap().is_none());

        root.remove();
    }
}
