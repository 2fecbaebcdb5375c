//! 請求書抽出（ネイティブ版）
//!
//! ブラウザ版と同じ状態機械を reqwest の multipart 送信で動かし、
//! 自動入力される値をコンソール用のフォームに書き込む。

use crate::config::Config;
use crate::error::{LabelFormsError, Result};
use label_forms_common::autofill::{CSRF_HEADER, DOCUMENT_FIELD};
use label_forms_common::{
    AutofillClient, AutofillOutcome, AutofillView, ExtractionError, ExtractionResult,
    ExtractionTransport, SelectedFile, TargetField,
};
use reqwest::multipart::{Form, Part};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// 読み込み済みのローカル請求書ファイル
#[derive(Debug, Clone)]
pub struct LocalDocument {
    pub path: PathBuf,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl LocalDocument {
    /// ファイルを読み込む（読めなければIOエラー）
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            media_type: media_type_for(path).to_string(),
            bytes,
        })
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string())
    }
}

/// 拡張子からメディアタイプを判定
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "doc" => "application/msword",
        _ => "application/octet-stream",
    }
}

/// reqwest による抽出APIクライアント
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl ExtractionTransport for HttpTransport {
    type Document = LocalDocument;

    async fn extract(
        &self,
        document: &LocalDocument,
        csrf_token: &str,
    ) -> std::result::Result<ExtractionResult, ExtractionError> {
        let part = Part::bytes(document.bytes.clone())
            .file_name(document.file_name())
            .mime_str(&document.media_type)
            .map_err(|e| ExtractionError::Document(e.to_string()))?;
        let form = Form::new().part(DOCUMENT_FIELD, part);

        debug!(url = %self.url, file = %document.path.display(), "uploading document");
        let response = self
            .client
            .post(&self.url)
            .header(CSRF_HEADER, csrf_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Status(status.as_u16()));
        }

        response
            .json::<ExtractionResult>()
            .await
            .map_err(|e| ExtractionError::Parse(e.to_string()))
    }
}

/// 標準出力向けのフォーム
#[derive(Debug, Default)]
pub struct ConsoleForm {
    fields: BTreeMap<&'static str, String>,
    rate_options: Vec<String>,
    highlighted: Vec<TargetField>,
    diagnostics: Vec<String>,
    busy: bool,
    extract_visible: bool,
}

impl ConsoleForm {
    pub fn new(rate_options: Vec<String>) -> Self {
        Self {
            rate_options,
            ..Default::default()
        }
    }

    pub fn value(&self, target: TargetField) -> Option<&str> {
        self.fields.get(target.default_id()).map(String::as_str)
    }

    /// 書き込まれた欄（ID順）
    pub fn fields(&self) -> &BTreeMap<&'static str, String> {
        &self.fields
    }

    pub fn highlighted(&self) -> &[TargetField] {
        &self.highlighted
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_extract_visible(&self) -> bool {
        self.extract_visible
    }
}

impl AutofillView for ConsoleForm {
    fn set_field(&mut self, target: TargetField, value: &str) {
        self.fields.insert(target.default_id(), value.to_string());
    }

    fn has_rate_option(&self, value: &str) -> bool {
        self.rate_options.iter().any(|o| o == value)
    }

    // 端末では時間経過で消さず、書き込んだ欄の一覧として残す
    fn highlight(&mut self, target: TargetField) {
        self.highlighted.push(target);
    }

    fn set_extract_visible(&mut self, visible: bool) {
        self.extract_visible = visible;
    }

    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    fn log_diagnostic(&mut self, message: &str) {
        warn!("{}", message);
        self.diagnostics.push(message.to_string());
    }
}

/// ファイル選択 → 抽出 → 書き込みを一通り実行
pub async fn extract_document<T>(
    transport: &T,
    file: &Path,
    csrf_token: &str,
    form: &mut ConsoleForm,
) -> Result<AutofillOutcome>
where
    T: ExtractionTransport<Document = LocalDocument>,
{
    if !file.exists() {
        return Err(LabelFormsError::FileNotFound(file.display().to_string()));
    }

    let document = LocalDocument::load(file).await?;
    let media_type = document.media_type.clone();

    let mut client = AutofillClient::new(csrf_token);
    client.attach(form);
    client.select_file(Some(SelectedFile::new(media_type.clone(), document)), form);

    if !form.is_extract_visible() {
        return Err(LabelFormsError::UnsupportedDocument(format!(
            "{} ({})",
            file.display(),
            media_type
        )));
    }

    Ok(client.extract_and_populate(transport, form).await)
}

/// 設定から抽出クライアントを作って実行
pub async fn run(config: &Config, file: &Path, form: &mut ConsoleForm) -> Result<AutofillOutcome> {
    let csrf_token = config.get_csrf_token()?;
    let transport = HttpTransport::new(config.extraction_url(), config.timeout_seconds)?;
    extract_document(&transport, file, &csrf_token, form).await
}
