//! Label Forms Web (Leptos + WASM)
//!
//! サーバー描画ページに明細フォームを取り付ける。
//! カタログと既存データはページが埋め込んだJSON文字列で受け取る。

mod api;
mod components;
mod cost_form;
mod dom;

use components::{artist_picker::ArtistPicker, row_collection::RowCollection};
use label_forms_common::row::{LineItemData, TrackData};
use label_forms_common::{
    Artist, Catalog, CollectionController, LineItemKind, LineItemRowFactory, RefId,
    SelectionRegistry, TrackRowFactory,
};
use leptos::prelude::*;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// 空文字は空配列として読む
fn parse_list<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, JsValue> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json).map_err(to_js)
}

/// トラック一覧（リリース単位のアーティスト選択付き）
///
/// 新規トラックにはその時点のリリースアーティストを初期選択し、
/// トラックに追加したアーティストはリリース側にも追加する。
#[wasm_bindgen]
pub fn mount_track_list(
    container_id: &str,
    catalog_json: &str,
    tracks_json: &str,
    release_artists_json: &str,
) -> Result<(), JsValue> {
    let container = dom::html_element_by_id(container_id)?;
    let catalog = Catalog::from_json(catalog_json).map_err(to_js)?;
    let tracks: Vec<TrackData> = parse_list(tracks_json)?;
    let release_ids: Vec<RefId> = parse_list(release_artists_json)?;

    leptos::mount::mount_to(container, move || {
        let mut release_registry =
            SelectionRegistry::new(Arc::clone(&catalog.artists), "artistIds").with_select();
        for id in &release_ids {
            release_registry.add(id.as_str());
        }
        let release = RwSignal::new(release_registry);

        let mut factory = TrackRowFactory::new(Arc::clone(&catalog.artists));
        factory.set_release_artists(release.with_untracked(|r| r.selected_ids()));
        factory.set_on_artist_add(Arc::new(move |id: &RefId, _: &Artist| {
            release.update(|r| {
                r.add(id.as_str());
            });
        }));
        let track_list = RwSignal::new(CollectionController::with_rows(factory, &tracks));

        Effect::new(move |_| {
            let ids = release.with(|r| r.selected_ids());
            track_list.update_untracked(|c| c.factory_mut().set_release_artists(ids));
        });

        view! {
            <ArtistPicker registry=release select_id="releaseArtistSelect" />
            <div id="trackList">
                <RowCollection controller=track_list add_button_id="addTrackBtn" add_label="Add Track" />
            </div>
        }
    })
    .forget();

    Ok(())
}

fn mount_line_items(
    container_id: &str,
    catalog_json: &str,
    items_json: &str,
    kind: LineItemKind,
) -> Result<(), JsValue> {
    let container = dom::html_element_by_id(container_id)?;
    let catalog = Catalog::from_json(catalog_json).map_err(to_js)?;
    let items: Vec<LineItemData> = parse_list(items_json)?;

    leptos::mount::mount_to(container, move || {
        let factory = LineItemRowFactory::new(kind, &catalog);
        let line_items = RwSignal::new(CollectionController::with_rows(factory, &items));

        view! {
            <div id="lineItems">
                <RowCollection controller=line_items add_button_id="addLineItemBtn" add_label="Add Item" />
            </div>
        }
    })
    .forget();

    Ok(())
}

/// 販売フォームの明細（数量・単価）
#[wasm_bindgen]
pub fn mount_sale_form(container_id: &str, catalog_json: &str, items_json: &str) -> Result<(), JsValue> {
    mount_line_items(container_id, catalog_json, items_json, LineItemKind::Sale)
}

/// 返品フォームの明細（数量のみ）
#[wasm_bindgen]
pub fn mount_return_form(container_id: &str, catalog_json: &str, items_json: &str) -> Result<(), JsValue> {
    mount_line_items(container_id, catalog_json, items_json, LineItemKind::Return)
}

/// コストフォーム（整合チェック・編集モーダル・請求書抽出）
#[wasm_bindgen]
pub fn mount_cost_form(config: JsValue) -> Result<(), JsValue> {
    let config: cost_form::CostFormConfig = serde_wasm_bindgen::from_value(config)?;
    cost_form::attach(config)
}

