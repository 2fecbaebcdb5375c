//! リリース単位のアーティスト選択

use crate::dom::event_element;
use label_forms_common::SelectionRegistry;
use leptos::prelude::*;

#[component]
pub fn ArtistPicker(
    registry: RwSignal<SelectionRegistry>,
    select_id: &'static str,
) -> impl IntoView {
    let options = registry.with_untracked(|r| r.catalog().to_vec());

    view! {
        <div class="release-artists mb-3">
            <label class="form-label" for=select_id>"Artists"</label>
            <select
                class="form-select"
                id=select_id
                prop:value=move || registry.with(|r| r.select_value().unwrap_or_default().to_string())
                on:change=move |ev| {
                    let value = event_target_value(&ev);
                    registry.update(|r| {
                        r.on_select_change(&value);
                    });
                }
            >
                <option value="">"Select artist..."</option>
                {options
                    .into_iter()
                    .map(|artist| {
                        view! { <option value=artist.id.to_string()>{artist.artist_name}</option> }
                    })
                    .collect_view()}
            </select>
            <div
                class="d-flex flex-wrap gap-1 mt-2"
                inner_html=move || registry.with(|r| r.chips_html())
                on:click=move |ev| {
                    let id = event_element(&ev).and_then(|el| el.get_attribute("data-remove-id"));
                    if let Some(id) = id {
                        registry.update(|r| {
                            r.remove(id);
                        });
                    }
                }
            ></div>
            <div inner_html=move || registry.with(|r| r.inputs_html())></div>
        </div>
    }
}
