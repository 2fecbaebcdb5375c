//! エラー型定義

use thiserror::Error;

/// 行コレクションのガード違反（最初の行・最後の行は削除できない）
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionError {
    #[error("the first row cannot be removed")]
    FirstRow,

    #[error("at least one row is required")]
    LastRow,

    #[error("row not found")]
    NotFound,
}

/// 抽出エンドポイント呼び出しの失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Extraction failed: {0}")]
    Status(u16),

    #[error("Extraction request failed: {0}")]
    Network(String),

    #[error("Extraction response could not be parsed: {0}")]
    Parse(String),

    #[error("Document could not be attached: {0}")]
    Document(String),
}

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Duration must be in MM:SS format: {0}")]
    InvalidDuration(String),

    #[error("Guard violation: {0}")]
    Guard(#[from] CollectionError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_display_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let error = Error::Json(json_error);
        assert!(format!("{}", error).contains("JSON error"));
    }

    #[test]
    fn test_error_display_invalid_duration() {
        let error = Error::InvalidDuration("305".to_string());
        assert_eq!(format!("{}", error), "Duration must be in MM:SS format: 305");
    }

    #[test]
    fn test_error_from_guard() {
        let error: Error = CollectionError::LastRow.into();
        assert!(matches!(error, Error::Guard(CollectionError::LastRow)));
        assert!(format!("{}", error).contains("at least one row"));
    }

    #[test]
    fn test_extraction_error_is_transparent() {
        let error: Error = ExtractionError::Status(502).into();
        assert_eq!(format!("{}", error), "Extraction failed: 502");
    }

    #[test]
    fn test_extraction_error_document() {
        let error = ExtractionError::Document("invalid media type".to_string());
        assert_eq!(format!("{}", error), "Document could not be attached: invalid media type");
    }

    #[test]
    fn test_error_debug() {
        let error = Error::Config("endpoint missing".to_string());
        let debug = format!("{:?}", error);
        assert!(debug.contains("Config"));
        assert!(debug.contains("endpoint missing"));
    }
}
