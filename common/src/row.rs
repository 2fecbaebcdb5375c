//! 行フラグメント生成
//!
//! 繰り返し入力の1単位（トラック行・明細行）を、添字入りのフィールド名で組み立てる。
//! - `TrackRowFactory`: アーティスト／リミキサー選択・曲名・長さ
//! - `LineItemRowFactory`: リリース・フォーマット・数量（販売のみ単価）
//!
//! `Row` はDOMを持たないモデルで、`to_html` でフラグメントを描画できる。

use crate::catalog::{Artist, Catalog, RefId, Release};
use crate::duration::format_duration;
use crate::html::{escape_attr, escape_html};
use crate::naming::{field_id, field_name, renumber_id, renumber_name};
use crate::selection::SelectionRegistry;
use serde::Deserialize;
use std::sync::Arc;

/// トラック行のコレクション名
pub const TRACKS: &str = "tracks";
/// 明細行のコレクション名
pub const LINE_ITEMS: &str = "lineItems";

/// トラック行のアーティスト追加時コールバック
pub type TrackArtistCallback = Arc<dyn Fn(&RefId, &Artist) + Send + Sync>;

/// コントローラー内で行を識別するキー（再利用しない）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowKey(pub u64);

/// 行の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Track,
    SaleItem,
    ReturnItem,
}

/// 明細の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineItemKind {
    Sale,
    Return,
}

/// 選択レジストリの役割
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionRole {
    Artist,
    Remixer,
}

impl SelectionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionRole::Artist => "artist",
            SelectionRole::Remixer => "remixer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "artist" => Some(SelectionRole::Artist),
            "remixer" => Some(SelectionRole::Remixer),
            _ => None,
        }
    }

    fn field(&self) -> &'static str {
        match self {
            SelectionRole::Artist => "artistIds",
            SelectionRole::Remixer => "remixerIds",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            SelectionRole::Artist => "Artist",
            SelectionRole::Remixer => "Remixer (optional)",
        }
    }
}

/// selectの選択肢
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// 入力欄の種類
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Select {
        placeholder: &'static str,
        options: Vec<SelectOption>,
    },
    Text {
        placeholder: Option<&'static str>,
        pattern: Option<&'static str>,
    },
    Number {
        min: &'static str,
        step: Option<&'static str>,
    },
}

/// 行内の1フィールド
#[derive(Debug, Clone, PartialEq)]
pub struct RowField {
    /// 末尾のフィールド名（`quantity` など）
    pub field: &'static str,
    pub label: &'static str,
    pub name: String,
    pub id: String,
    pub kind: FieldKind,
    pub value: String,
}

/// 行内のアーティスト選択
#[derive(Debug)]
pub struct RowSelection {
    pub role: SelectionRole,
    pub registry: SelectionRegistry,
}

/// 行フラグメント
#[derive(Debug)]
pub struct Row {
    pub(crate) key: RowKey,
    kind: RowKind,
    collection: &'static str,
    index: usize,
    fields: Vec<RowField>,
    selections: Vec<RowSelection>,
    ordinal: usize,
    remove_visible: bool,
}

impl Row {
    fn new(kind: RowKind, collection: &'static str, index: usize) -> Self {
        Self {
            key: RowKey(0),
            kind,
            collection,
            index,
            fields: Vec::new(),
            selections: Vec::new(),
            ordinal: index + 1,
            remove_visible: false,
        }
    }

    pub fn key(&self) -> RowKey {
        self.key
    }

    pub fn kind(&self) -> RowKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// 表示上の番号（1始まり）
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn remove_visible(&self) -> bool {
        self.remove_visible
    }

    pub fn fields(&self) -> &[RowField] {
        &self.fields
    }

    pub fn field(&self, field: &str) -> Option<&RowField> {
        self.fields.iter().find(|f| f.field == field)
    }

    pub fn field_mut(&mut self, field: &str) -> Option<&mut RowField> {
        self.fields.iter_mut().find(|f| f.field == field)
    }

    pub fn selections(&self) -> &[RowSelection] {
        &self.selections
    }

    pub fn selection(&self, role: SelectionRole) -> Option<&SelectionRegistry> {
        self.selections
            .iter()
            .find(|s| s.role == role)
            .map(|s| &s.registry)
    }

    pub fn selection_mut(&mut self, role: SelectionRole) -> Option<&mut SelectionRegistry> {
        self.selections
            .iter_mut()
            .find(|s| s.role == role)
            .map(|s| &mut s.registry)
    }

    /// 添字を振り直す。name/id の末尾フィールド名はそのまま。
    pub fn renumber(&mut self, index: usize) {
        self.index = index;
        for field in &mut self.fields {
            field.name = renumber_name(&field.name, index);
            field.id = renumber_id(&field.id, index);
        }
        for selection in &mut self.selections {
            let renamed = renumber_name(selection.registry.field_name(), index);
            selection.registry.rename_field(renamed);
        }
    }

    pub(crate) fn set_display(&mut self, ordinal: usize, remove_visible: bool) {
        self.ordinal = ordinal;
        self.remove_visible = remove_visible;
    }

    fn push_field(&mut self, field: &'static str, label: &'static str, kind: FieldKind, value: String) {
        self.fields.push(RowField {
            field,
            label,
            name: field_name(self.collection, self.index, field),
            id: field_id(self.collection, self.index, field),
            kind,
            value,
        });
    }

    /// フラグメントをHTMLとして描画
    pub fn to_html(&self) -> String {
        match self.kind {
            RowKind::Track => self.track_html(),
            RowKind::SaleItem | RowKind::ReturnItem => self.line_item_html(),
        }
    }

    fn remove_style(&self) -> &'static str {
        if self.remove_visible {
            "display: inline-block"
        } else {
            "display: none"
        }
    }

    fn track_html(&self) -> String {
        let mut html = format!(
            r#"<div class="track-row mb-3 p-2 border rounded" data-track-index="{}" data-row-key="{}"><div class="row g-2 align-items-end">"#,
            self.index, self.key.0
        );

        for selection in &self.selections {
            let role = selection.role.as_str();
            html.push_str(&format!(
                concat!(
                    r#"<div class="col-md-3"><label class="form-label">{label}</label><div class="input-group">"#,
                    r#"<select class="form-select track-{role}-select" data-role="{role}" data-testid="track-{role}-select">"#,
                    r#"<option value="">Select...</option>{options}</select>"#,
                    r#"<button class="btn btn-outline-secondary btn-sm add-track-{role}-btn" data-role="{role}" type="button">+</button>"#,
                    r#"</div></div>"#
                ),
                label = selection.role.label(),
                role = role,
                options = artist_options_html(&selection.registry),
            ));
        }

        for field in &self.fields {
            let col = if field.field == "duration" { "col-md-2" } else { "col-md-3" };
            html.push_str(&format!(
                r#"<div class="{}"><label class="form-label" for="{}">{}</label>{}</div>"#,
                col,
                escape_attr(&field.id),
                field.label,
                field_html(field),
            ));
        }

        html.push_str(&format!(
            r#"<div class="col-md-1 text-end"><button type="button" class="btn btn-outline-danger btn-sm remove-track" style="{}">X</button></div></div>"#,
            self.remove_style()
        ));

        for selection in &self.selections {
            let role = selection.role.as_str();
            html.push_str(&format!(
                r#"<div class="track-{role}-tags d-flex flex-wrap gap-1 mt-2">{}</div><div class="track-{role}-inputs">{}</div>"#,
                selection.registry.chips_html(),
                selection.registry.inputs_html(),
                role = role,
            ));
        }

        html.push_str("</div>");
        html
    }

    fn line_item_html(&self) -> String {
        let mut html = format!(
            concat!(
                r#"<div class="card mb-3 line-item" data-row-key="{}"><div class="card-body">"#,
                r#"<div class="d-flex justify-content-between align-items-center mb-2">"#,
                r#"<strong>Item <span class="item-number">{}</span></strong>"#,
                r#"<button type="button" class="btn btn-outline-danger btn-sm remove-item" style="{}">Remove</button>"#,
                r#"</div><div class="row">"#
            ),
            self.key.0,
            self.ordinal,
            self.remove_style(),
        );

        for field in &self.fields {
            html.push_str(&format!(
                r#"<div class="{}"><label for="{}" class="form-label">{}</label>{}</div>"#,
                column_class(self.kind, field.field),
                escape_attr(&field.id),
                field.label,
                field_html(field),
            ));
        }

        html.push_str("</div></div></div>");
        html
    }
}

fn column_class(kind: RowKind, field: &str) -> &'static str {
    match (kind, field) {
        (RowKind::SaleItem, "releaseId") => "col-md-4",
        (RowKind::SaleItem, "format") => "col-md-2",
        (RowKind::SaleItem, _) => "col-md-3",
        _ => "col-md-4",
    }
}

fn artist_options_html(registry: &SelectionRegistry) -> String {
    registry
        .catalog()
        .iter()
        .map(|a| {
            format!(
                r#"<option value="{}">{}</option>"#,
                escape_attr(a.id.as_str()),
                escape_html(&a.artist_name)
            )
        })
        .collect()
}

fn field_html(field: &RowField) -> String {
    let name = escape_attr(&field.name);
    let id = escape_attr(&field.id);
    match &field.kind {
        FieldKind::Select { placeholder, options } => {
            let options: String = options
                .iter()
                .map(|o| {
                    let selected = if o.value == field.value { " selected" } else { "" };
                    format!(
                        r#"<option value="{}"{}>{}</option>"#,
                        escape_attr(&o.value),
                        selected,
                        escape_html(&o.label)
                    )
                })
                .collect();
            format!(
                r#"<select class="form-select" id="{}" name="{}" required><option value="">{}</option>{}</select>"#,
                id, name, placeholder, options
            )
        }
        FieldKind::Text { placeholder, pattern } => {
            let mut extra = String::new();
            if let Some(p) = placeholder {
                extra.push_str(&format!(r#" placeholder="{}""#, p));
            }
            if let Some(p) = pattern {
                extra.push_str(&format!(r#" pattern="{}""#, p));
            }
            format!(
                r#"<input type="text" class="form-control" id="{}" name="{}" value="{}"{} required>"#,
                id,
                name,
                escape_attr(&field.value),
                extra
            )
        }
        FieldKind::Number { min, step } => {
            let step = step.map(|s| format!(r#" step="{}""#, s)).unwrap_or_default();
            format!(
                r#"<input type="number" class="form-control" id="{}" name="{}" value="{}" min="{}"{} required>"#,
                id,
                name,
                escape_attr(&field.value),
                min,
                step
            )
        }
    }
}

/// 行ファクトリ
pub trait RowFactory {
    /// 既存データ（編集時のハイドレーション用）
    type Data;

    /// 削除ガード時に表示するメッセージ
    const GUARD_MESSAGE: &'static str;

    fn build(&self, index: usize, existing: Option<&Self::Data>) -> Row;
}

// =============================================
// トラック行
// =============================================

/// 既存トラックの長さ
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDurationData {
    pub total_seconds: u32,
}

/// 参照（`{id}` のみ使用）
#[derive(Debug, Clone, Deserialize)]
pub struct EntityRef {
    pub id: RefId,
}

/// 既存トラック
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackData {
    pub name: String,
    pub duration: Option<TrackDurationData>,
    pub artists: Vec<EntityRef>,
    pub remixers: Vec<EntityRef>,
}

/// トラック行ファクトリ
pub struct TrackRowFactory {
    artists: Arc<[Artist]>,
    release_artists: Vec<RefId>,
    on_artist_add: Option<TrackArtistCallback>,
}

impl TrackRowFactory {
    pub fn new(artists: Arc<[Artist]>) -> Self {
        Self {
            artists,
            release_artists: Vec::new(),
            on_artist_add: None,
        }
    }

    /// 新規トラックに初期選択するリリースアーティスト
    pub fn set_release_artists(&mut self, ids: Vec<RefId>) {
        self.release_artists = ids;
    }

    pub fn set_on_artist_add(&mut self, callback: TrackArtistCallback) {
        self.on_artist_add = Some(callback);
    }

    fn registry(&self, index: usize, role: SelectionRole) -> SelectionRegistry {
        let registry = SelectionRegistry::new(
            Arc::clone(&self.artists),
            field_name(TRACKS, index, role.field()),
        )
        .with_select();

        match (&self.on_artist_add, role) {
            (Some(callback), SelectionRole::Artist) => {
                let callback = Arc::clone(callback);
                registry.on_add(Box::new(move |id: &RefId, artist: &Artist| callback(id, artist)))
            }
            _ => registry,
        }
    }
}

impl RowFactory for TrackRowFactory {
    type Data = TrackData;

    const GUARD_MESSAGE: &'static str = "At least one track is required";

    fn build(&self, index: usize, existing: Option<&TrackData>) -> Row {
        let mut row = Row::new(RowKind::Track, TRACKS, index);

        for role in [SelectionRole::Artist, SelectionRole::Remixer] {
            row.selections.push(RowSelection {
                role,
                registry: self.registry(index, role),
            });
        }

        let name = existing.map(|t| t.name.clone()).unwrap_or_default();
        let duration = format_duration(existing.and_then(|t| t.duration).map(|d| d.total_seconds));

        row.push_field(
            "name",
            "Name",
            FieldKind::Text { placeholder: None, pattern: None },
            name,
        );
        row.push_field(
            "duration",
            "Duration",
            FieldKind::Text {
                placeholder: Some("MM:SS"),
                pattern: Some("[0-9]+:[0-5][0-9]"),
            },
            duration,
        );

        match existing {
            Some(track) => {
                if let Some(registry) = row.selection_mut(SelectionRole::Artist) {
                    for artist in &track.artists {
                        registry.add(artist.id.as_str());
                    }
                }
                if let Some(registry) = row.selection_mut(SelectionRole::Remixer) {
                    for remixer in &track.remixers {
                        registry.add(remixer.id.as_str());
                    }
                }
            }
            None => {
                if let Some(registry) = row.selection_mut(SelectionRole::Artist) {
                    for id in &self.release_artists {
                        registry.add(id.as_str());
                    }
                }
            }
        }

        row
    }
}

// =============================================
// 明細行（販売・返品）
// =============================================

/// 既存明細
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItemData {
    pub release_id: Option<RefId>,
    pub format: Option<String>,
    pub quantity: Option<u32>,
    pub unit_price: Option<f64>,
}

/// 明細行ファクトリ
pub struct LineItemRowFactory {
    kind: LineItemKind,
    releases: Arc<[Release]>,
    formats: Arc<[String]>,
}

impl LineItemRowFactory {
    pub fn new(kind: LineItemKind, catalog: &Catalog) -> Self {
        Self {
            kind,
            releases: Arc::clone(&catalog.releases),
            formats: Arc::clone(&catalog.formats),
        }
    }

    pub fn kind(&self) -> LineItemKind {
        self.kind
    }
}

impl RowFactory for LineItemRowFactory {
    type Data = LineItemData;

    const GUARD_MESSAGE: &'static str = "At least one line item is required";

    fn build(&self, index: usize, existing: Option<&LineItemData>) -> Row {
        let row_kind = match self.kind {
            LineItemKind::Sale => RowKind::SaleItem,
            LineItemKind::Return => RowKind::ReturnItem,
        };
        let mut row = Row::new(row_kind, LINE_ITEMS, index);

        let release_options = self
            .releases
            .iter()
            .map(|r| SelectOption {
                value: r.id.to_string(),
                label: r.name.clone(),
            })
            .collect();
        let format_options = self
            .formats
            .iter()
            .map(|f| SelectOption {
                value: f.clone(),
                label: f.clone(),
            })
            .collect();

        row.push_field(
            "releaseId",
            "Release*",
            FieldKind::Select {
                placeholder: "Select release...",
                options: release_options,
            },
            existing
                .and_then(|d| d.release_id.as_ref())
                .map(|id| id.to_string())
                .unwrap_or_default(),
        );
        row.push_field(
            "format",
            "Format*",
            FieldKind::Select {
                placeholder: "Select...",
                options: format_options,
            },
            existing.and_then(|d| d.format.clone()).unwrap_or_default(),
        );
        row.push_field(
            "quantity",
            "Quantity*",
            FieldKind::Number { min: "1", step: None },
            existing
                .and_then(|d| d.quantity)
                .map(|q| q.to_string())
                .unwrap_or_default(),
        );

        // 返品には単価欄が無い
        if self.kind == LineItemKind::Sale {
            row.push_field(
                "unitPrice",
                "Unit Price*",
                FieldKind::Number { min: "0", step: Some("0.01") },
                existing
                    .and_then(|d| d.unit_price)
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
            );
        }

        row
    }
}
