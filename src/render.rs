//! 行HTMLの描画（サーバー描画テンプレートの確認用）

use crate::cli::RowKindArg;
use crate::error::{LabelFormsError, Result};
use label_forms_common::collection::{return_line_items, sale_line_items, track_list};
use label_forms_common::{Catalog, CollectionController, LineItemData, RowFactory, TrackData};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

/// カタログJSONを読み込む
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    if !path.exists() {
        return Err(LabelFormsError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Catalog::from_json(&content)?)
}

fn load_rows<T: DeserializeOwned>(path: Option<&Path>) -> Result<Vec<T>> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(LabelFormsError::FileNotFound(path.display().to_string()));
            }
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(Vec::new()),
    }
}

fn render<F>(mut controller: CollectionController<F>, existing: &[F::Data], add: usize) -> String
where
    F: RowFactory,
{
    controller.initialize(existing);
    for _ in 0..add {
        controller.add_row();
    }
    debug!(rows = controller.len(), "rendering rows");
    controller.to_html()
}

/// 指定種類の行コレクションを初期化してHTMLを返す
pub fn render_rows(kind: RowKindArg, catalog: &Catalog, existing: Option<&Path>, add: usize) -> Result<String> {
    let html = match kind {
        RowKindArg::Track => render(track_list(catalog), &load_rows::<TrackData>(existing)?, add),
        RowKindArg::Sale => render(sale_line_items(catalog), &load_rows::<LineItemData>(existing)?, add),
        RowKindArg::Return => render(return_line_items(catalog), &load_rows::<LineItemData>(existing)?, add),
    };
    Ok(html)
}
