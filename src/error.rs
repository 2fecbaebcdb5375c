use label_forms_common::ExtractionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelFormsError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("CSRFトークンが設定されていません。`label-forms config --set-csrf-token TOKEN` または LABEL_FORMS_CSRF_TOKEN で設定してください")]
    MissingCsrfToken,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("抽出できないファイル形式です: {0}")]
    UnsupportedDocument(String),

    #[error("金額の整合性エラー（{0}件）")]
    InconsistentAmounts(usize),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Common(#[from] label_forms_common::Error),

    #[error("HTTPクライアントエラー: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LabelFormsError>;
