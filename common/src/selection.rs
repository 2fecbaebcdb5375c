//! アーティスト選択レジストリ
//!
//! 選択済みID・チップ・hidden input を常に 1:1:1 で保持する。
//! 重複や未知のIDは黙って拒否する（戻り値 `false`）。

use crate::catalog::{find_artist, Artist, RefId};
use crate::html::{escape_attr, escape_html};
use std::fmt;
use std::sync::Arc;

/// 追加時コールバック
pub type AddCallback = Box<dyn Fn(&RefId, &Artist) + Send + Sync>;
/// 削除時コールバック
pub type RemoveCallback = Box<dyn Fn(&RefId) + Send + Sync>;

/// 選択済みアーティストの表示トークン
#[derive(Debug, Clone, PartialEq)]
pub struct Chip {
    pub id: RefId,
    pub label: String,
}

impl Chip {
    pub fn to_html(&self) -> String {
        format!(
            concat!(
                r#"<span class="badge bg-secondary d-flex align-items-center gap-1" data-artist-id="{id}">"#,
                r#"{label} <button type="button" class="btn-close btn-close-white" "#,
                r#"style="font-size: 0.6rem" aria-label="Remove" data-remove-id="{id}"></button></span>"#
            ),
            id = escape_attr(self.id.as_str()),
            label = escape_html(&self.label),
        )
    }
}

/// 送信用の hidden input
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenInput {
    pub name: String,
    pub value: RefId,
}

impl HiddenInput {
    pub fn to_html(&self) -> String {
        format!(
            r#"<input type="hidden" name="{}" value="{}">"#,
            escape_attr(&self.name),
            escape_attr(self.value.as_str())
        )
    }
}

/// 選択レジストリ
pub struct SelectionRegistry {
    artists: Arc<[Artist]>,
    field_name: String,
    selected: Vec<RefId>,
    chips: Vec<Chip>,
    inputs: Vec<HiddenInput>,
    /// 紐付いたselectの現在値（未バインドなら None）
    select_value: Option<String>,
    on_add: Option<AddCallback>,
    on_remove: Option<RemoveCallback>,
}

impl SelectionRegistry {
    pub fn new(artists: Arc<[Artist]>, field_name: impl Into<String>) -> Self {
        Self {
            artists,
            field_name: field_name.into(),
            selected: Vec::new(),
            chips: Vec::new(),
            inputs: Vec::new(),
            select_value: None,
            on_add: None,
            on_remove: None,
        }
    }

    /// selectコントロールに紐付ける（初期値は空オプション）
    pub fn with_select(mut self) -> Self {
        self.select_value = Some(String::new());
        self
    }

    pub fn on_add(mut self, callback: AddCallback) -> Self {
        self.on_add = Some(callback);
        self
    }

    pub fn on_remove(mut self, callback: RemoveCallback) -> Self {
        self.on_remove = Some(callback);
        self
    }

    /// アーティストを追加
    ///
    /// 空・選択済み・カタログに無いIDは `false`。
    pub fn add(&mut self, id: impl AsRef<str>) -> bool {
        let id = RefId::new(id);
        if id.is_empty() || self.is_selected(id.as_str()) {
            return false;
        }

        let artist = match find_artist(&self.artists, &id) {
            Some(artist) => artist.clone(),
            None => return false,
        };

        self.selected.push(id.clone());
        self.chips.push(Chip {
            id: id.clone(),
            label: artist.artist_name.clone(),
        });
        self.inputs.push(HiddenInput {
            name: self.field_name.clone(),
            value: id.clone(),
        });

        if let Some(value) = self.select_value.as_mut() {
            value.clear();
        }

        if let Some(callback) = &self.on_add {
            callback(&id, &artist);
        }

        true
    }

    /// アーティストを削除。未選択なら `false`。
    pub fn remove(&mut self, id: impl AsRef<str>) -> bool {
        let id = RefId::new(id);
        let position = match self.selected.iter().position(|s| s == &id) {
            Some(p) => p,
            None => return false,
        };

        self.selected.remove(position);
        self.chips.retain(|c| c.id != id);
        self.inputs.retain(|i| i.value != id);

        if let Some(callback) = &self.on_remove {
            callback(&id);
        }

        true
    }

    /// 全選択を一括で解除
    pub fn clear(&mut self) {
        self.selected.clear();
        self.chips.clear();
        self.inputs.clear();
        if let Some(value) = self.select_value.as_mut() {
            value.clear();
        }
    }

    /// 選択済みIDのコピー
    pub fn selected_ids(&self) -> Vec<RefId> {
        self.selected.clone()
    }

    pub fn is_selected(&self, id: impl AsRef<str>) -> bool {
        let id = RefId::new(id);
        self.selected.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// 参照カタログ（select の選択肢）
    pub fn catalog(&self) -> &[Artist] {
        &self.artists
    }

    pub fn chips(&self) -> &[Chip] {
        &self.chips
    }

    pub fn hidden_inputs(&self) -> &[HiddenInput] {
        &self.inputs
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// hidden input の name をまとめて書き換える（行の番号振り直し用）
    pub fn rename_field(&mut self, field_name: impl Into<String>) {
        self.field_name = field_name.into();
        for input in &mut self.inputs {
            input.name = self.field_name.clone();
        }
    }

    pub fn select_value(&self) -> Option<&str> {
        self.select_value.as_deref()
    }

    /// selectのchangeイベント。選択値をそのまま追加する。
    pub fn on_select_change(&mut self, value: &str) -> bool {
        if let Some(current) = self.select_value.as_mut() {
            *current = value.to_string();
        }
        self.add(value)
    }

    pub fn chips_html(&self) -> String {
        self.chips.iter().map(Chip::to_html).collect()
    }

    pub fn inputs_html(&self) -> String {
        self.inputs.iter().map(HiddenInput::to_html).collect()
    }
}

impl fmt::Debug for SelectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionRegistry")
            .field("field_name", &self.field_name)
            .field("selected", &self.selected)
            .field("select_value", &self.select_value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn artists() -> Arc<[Artist]> {
        vec![
            Artist { id: RefId::from(1), artist_name: "Aphex Twin".into() },
            Artist { id: RefId::from(2), artist_name: "Burial".into() },
            Artist { id: RefId::from(3), artist_name: "<Boards & Canada>".into() },
        ]
        .into()
    }

    #[test]
    fn test_add_creates_chip_and_input() {
        let mut registry = SelectionRegistry::new(artists(), "artistIds");

        assert!(registry.add("1"));
        assert_eq!(registry.chips(), &[Chip { id: "1".into(), label: "Aphex Twin".into() }]);
        assert_eq!(
            registry.hidden_inputs(),
            &[HiddenInput { name: "artistIds".into(), value: "1".into() }]
        );
    }

    #[test]
    fn test_add_twice_keeps_one_chip() {
        let mut registry = SelectionRegistry::new(artists(), "artistIds");

        assert!(registry.add("2"));
        assert!(!registry.add("2"));
        assert!(!registry.add(" 2 "));
        assert_eq!(registry.chips().len(), 1);
        assert_eq!(registry.hidden_inputs().len(), 1);
    }

    #[test]
    fn test_add_rejects_empty_and_unknown() {
        let mut registry = SelectionRegistry::new(artists(), "artistIds");

        assert!(!registry.add(""));
        assert!(!registry.add("99"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_never_added_changes_nothing() {
        let mut registry = SelectionRegistry::new(artists(), "artistIds");
        registry.add("1");

        assert!(!registry.remove("2"));
        assert_eq!(registry.selected_ids(), vec![RefId::from(1)]);
        assert_eq!(registry.chips().len(), 1);
        assert_eq!(registry.hidden_inputs().len(), 1);
    }

    #[test]
    fn test_remove_keeps_correspondence() {
        let mut registry = SelectionRegistry::new(artists(), "artistIds");
        registry.add("1");
        registry.add("2");
        registry.add("3");

        assert!(registry.remove("2"));
        let ids: Vec<&str> = registry.chips().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        let values: Vec<&str> = registry.hidden_inputs().iter().map(|i| i.value.as_str()).collect();
        assert_eq!(values, vec!["1", "3"]);
    }

    #[test]
    fn test_selected_ids_is_a_copy() {
        let mut registry = SelectionRegistry::new(artists(), "artistIds");
        registry.add("1");

        let mut copy = registry.selected_ids();
        copy.push(RefId::from(2));
        copy.clear();

        assert_eq!(registry.selected_ids(), vec![RefId::from(1)]);
    }

    #[test]
    fn test_clear_resets_select() {
        let mut registry = SelectionRegistry::new(artists(), "artistIds").with_select();
        registry.add("1");
        registry.add("2");

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.chips().is_empty());
        assert!(registry.hidden_inputs().is_empty());
        assert_eq!(registry.select_value(), Some(""));
    }

    #[test]
    fn test_select_change_adds_and_resets() {
        let mut registry = SelectionRegistry::new(artists(), "artistIds").with_select();

        assert!(registry.on_select_change("3"));
        assert!(registry.is_selected("3"));
        assert_eq!(registry.select_value(), Some(""));

        // 未知の値は追加されずselectに残る
        assert!(!registry.on_select_change("42"));
        assert_eq!(registry.select_value(), Some("42"));
    }

    #[test]
    fn test_callbacks() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let add_log = Arc::clone(&log);
        let remove_log = Arc::clone(&log);

        let mut registry = SelectionRegistry::new(artists(), "artistIds")
            .on_add(Box::new(move |id: &RefId, artist: &Artist| {
                add_log.lock().unwrap().push(format!("add {} {}", id, artist.artist_name));
            }))
            .on_remove(Box::new(move |id: &RefId| {
                remove_log.lock().unwrap().push(format!("remove {}", id));
            }));

        registry.add("1");
        registry.add("1");
        registry.remove("1");
        registry.remove("1");

        assert_eq!(*log.lock().unwrap(), vec!["add 1 Aphex Twin", "remove 1"]);
    }

    #[test]
    fn test_rename_field_rewrites_inputs() {
        let mut registry = SelectionRegistry::new(artists(), "tracks[2].artistIds");
        registry.add("1");
        registry.add("2");

        registry.rename_field("tracks[1].artistIds");
        registry.add("3");

        assert!(registry.hidden_inputs().iter().all(|i| i.name == "tracks[1].artistIds"));
    }

    #[test]
    fn test_chip_html_is_escaped() {
        let mut registry = SelectionRegistry::new(artists(), "artistIds");
        registry.add("3");

        let html = registry.chips_html();
        assert!(html.contains("&lt;Boards &amp; Canada&gt;"));
        assert!(html.contains(r#"data-artist-id="3""#));
        assert_eq!(registry.inputs_html(), r#"<input type="hidden" name="artistIds" value="3">"#);
    }
}
