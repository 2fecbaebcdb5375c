//! Label Forms Common Library
//!
//! CLIとWeb(WASM)で共有する明細フォームのモデル。DOMに依存しない。

pub mod error;
pub mod duration;
pub mod html;
pub mod cost;
pub mod catalog;
pub mod naming;
pub mod selection;
pub mod row;
pub mod collection;
pub mod autofill;

pub use error::{CollectionError, Error, ExtractionError, Result};
pub use duration::{format_duration, parse_duration};
pub use cost::{validate_cost, CostData, CostEntry, CostForm, SubmitDecision};
pub use catalog::{Artist, Catalog, RefId, Release};
pub use selection::SelectionRegistry;
pub use row::{
    LineItemData, LineItemKind, LineItemRowFactory, Row, RowFactory, RowKey, RowKind,
    SelectionRole, TrackData, TrackRowFactory,
};
pub use collection::{CollectionController, LineItems, RowEvent, TrackList};
pub use autofill::{
    AutofillClient, AutofillOutcome, AutofillState, AutofillView, ExtractionResult,
    ExtractionTransport, SelectedFile, TargetField,
};
