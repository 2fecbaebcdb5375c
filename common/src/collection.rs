//! 繰り返し行コントローラー
//!
//! 行の追加・削除・番号振り直しと表示更新を管理する。
//! - 添字は常に `0..N-1` で連続
//! - 先頭行と最後の1行は削除不可
//! - 削除ボタンは `i > 0 && N > 1` のときだけ表示
//!
//! イベントはコンテナ単位で受ける想定なので、`handle_event` に
//! 行キー付きのイベントを渡せば追加行の個別配線は要らない。

use crate::catalog::Catalog;
use crate::error::CollectionError;
use crate::row::{
    LineItemKind, LineItemRowFactory, Row, RowFactory, RowKey, SelectionRole, TrackRowFactory,
};
use std::sync::Arc;
use tracing::debug;

/// 先頭行の削除を拒否したときのアラート文言
pub const FIRST_ROW_MESSAGE: &str = "The first row cannot be removed";

/// コンテナに届くイベント
#[derive(Debug, Clone, PartialEq)]
pub enum RowEvent {
    /// 削除ボタン
    RemoveClicked { row: RowKey },
    /// アーティストselectの変更
    SelectChanged {
        row: RowKey,
        role: SelectionRole,
        value: String,
    },
    /// 「+」ボタン（selectの現在値を追加）
    AddSelectedClicked { row: RowKey, role: SelectionRole },
    /// チップの削除ボタン
    ChipRemoveClicked {
        row: RowKey,
        role: SelectionRole,
        id: String,
    },
    /// 入力欄の値変更
    FieldInput {
        row: RowKey,
        field: String,
        value: String,
    },
}

/// 繰り返し行コントローラー
#[derive(Debug)]
pub struct CollectionController<F: RowFactory> {
    factory: F,
    rows: Vec<Row>,
    next_key: u64,
}

/// トラック一覧
pub type TrackList = CollectionController<TrackRowFactory>;
/// 販売・返品明細
pub type LineItems = CollectionController<LineItemRowFactory>;

/// トラック一覧を生成
pub fn track_list(catalog: &Catalog) -> TrackList {
    CollectionController::new(TrackRowFactory::new(Arc::clone(&catalog.artists)))
}

/// 販売明細を生成
pub fn sale_line_items(catalog: &Catalog) -> LineItems {
    CollectionController::new(LineItemRowFactory::new(LineItemKind::Sale, catalog))
}

/// 返品明細を生成
pub fn return_line_items(catalog: &Catalog) -> LineItems {
    CollectionController::new(LineItemRowFactory::new(LineItemKind::Return, catalog))
}

impl<F: RowFactory> CollectionController<F> {
    /// 空の行1つで開始
    pub fn new(factory: F) -> Self {
        Self::with_rows(factory, &[])
    }

    /// 既存データがあれば1件1行、無ければ空の行1つで開始
    pub fn with_rows(factory: F, existing: &[F::Data]) -> Self {
        let mut controller = Self {
            factory,
            rows: Vec::new(),
            next_key: 0,
        };
        controller.initialize(existing);
        controller
    }

    /// 全行を破棄して初期状態を作り直す
    pub fn initialize(&mut self, existing: &[F::Data]) {
        self.clear();

        if existing.is_empty() {
            self.push_row(None);
        } else {
            for data in existing {
                self.push_row(Some(data));
            }
        }

        self.refresh();
        debug!(rows = self.rows.len(), "collection initialized");
    }

    /// 全行（と各行の選択レジストリ）を破棄する
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// 末尾に空の行を追加
    pub fn add_row(&mut self) -> RowKey {
        let key = self.push_row(None);
        self.refresh();
        debug!(rows = self.rows.len(), "row added");
        key
    }

    fn push_row(&mut self, data: Option<&F::Data>) -> RowKey {
        let mut row = self.factory.build(self.rows.len(), data);
        let key = RowKey(self.next_key);
        self.next_key += 1;
        row.key = key;
        self.rows.push(row);
        key
    }

    /// 削除可否の判定（表示ルールと同じ条件）
    pub fn check_removable(&self, key: RowKey) -> Result<usize, CollectionError> {
        let position = self.position(key).ok_or(CollectionError::NotFound)?;
        if self.rows.len() <= 1 {
            return Err(CollectionError::LastRow);
        }
        if position == 0 {
            return Err(CollectionError::FirstRow);
        }
        Ok(position)
    }

    /// 行を削除して残りの添字を詰める
    ///
    /// 拒否された場合は状態を変えずにエラーを返す。
    pub fn remove_row(&mut self, key: RowKey) -> Result<(), CollectionError> {
        let position = self.check_removable(key)?;

        self.rows.remove(position);
        self.renumber();
        self.refresh();
        debug!(rows = self.rows.len(), removed = position, "row removed");
        Ok(())
    }

    /// 位置指定で削除
    pub fn remove_at(&mut self, index: usize) -> Result<(), CollectionError> {
        let key = self.rows.get(index).map(Row::key).ok_or(CollectionError::NotFound)?;
        self.remove_row(key)
    }

    fn renumber(&mut self) {
        for (index, row) in self.rows.iter_mut().enumerate() {
            if row.index() != index {
                row.renumber(index);
            }
        }
    }

    /// 番号表示と削除ボタンの表示を更新
    pub fn refresh(&mut self) {
        let len = self.rows.len();
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.set_display(index + 1, index > 0 && len > 1);
        }
    }

    /// コンテナ単位のイベント処理
    ///
    /// 状態が変わったら `Ok(true)`。削除ガードに掛かったら `Err`。
    pub fn handle_event(&mut self, event: RowEvent) -> Result<bool, CollectionError> {
        match event {
            RowEvent::RemoveClicked { row } => self.remove_row(row).map(|_| true),
            RowEvent::SelectChanged { row, role, value } => {
                let registry = self.registry_mut(row, role)?;
                Ok(registry.on_select_change(&value))
            }
            RowEvent::AddSelectedClicked { row, role } => {
                let registry = self.registry_mut(row, role)?;
                let value = registry.select_value().unwrap_or_default().to_string();
                Ok(registry.add(value))
            }
            RowEvent::ChipRemoveClicked { row, role, id } => {
                let registry = self.registry_mut(row, role)?;
                Ok(registry.remove(id))
            }
            RowEvent::FieldInput { row, field, value } => Ok(self.set_field_value(row, &field, value)),
        }
    }

    fn registry_mut(
        &mut self,
        key: RowKey,
        role: SelectionRole,
    ) -> Result<&mut crate::selection::SelectionRegistry, CollectionError> {
        self.row_mut(key)
            .and_then(|r| r.selection_mut(role))
            .ok_or(CollectionError::NotFound)
    }

    /// 入力値を行モデルへ反映
    pub fn set_field_value(&mut self, key: RowKey, field: &str, value: String) -> bool {
        match self.row_mut(key).and_then(|r| r.field_mut(field)) {
            Some(f) => {
                f.value = value;
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> Vec<RowKey> {
        self.rows.iter().map(Row::key).collect()
    }

    pub fn position(&self, key: RowKey) -> Option<usize> {
        self.rows.iter().position(|r| r.key() == key)
    }

    pub fn row(&self, key: RowKey) -> Option<&Row> {
        self.rows.iter().find(|r| r.key() == key)
    }

    pub fn row_mut(&mut self, key: RowKey) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| r.key() == key)
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// 削除ガード時のアラート文言（対象外のエラーは `None`）
    pub fn guard_message(&self, error: &CollectionError) -> Option<&'static str> {
        match error {
            CollectionError::FirstRow => Some(FIRST_ROW_MESSAGE),
            CollectionError::LastRow => Some(F::GUARD_MESSAGE),
            CollectionError::NotFound => None,
        }
    }

    /// 全行をHTMLとして描画
    pub fn to_html(&self) -> String {
        self.rows.iter().map(Row::to_html).collect()
    }
}
