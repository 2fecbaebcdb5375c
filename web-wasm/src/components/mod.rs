//! UIコンポーネント

pub mod artist_picker;
pub mod row_collection;
