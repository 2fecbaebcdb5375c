//! 請求書抽出による自動入力
//!
//! ファイル選択 → 抽出エンドポイントへアップロード → 返ってきた項目をフォームへ書き込む。
//!
//! 状態遷移:
//! - `Idle`: 抽出ボタン非表示
//! - `Ready`: 対応形式のファイルが選択済み、ボタン表示
//! - `Extracting`: ボタン無効・処理中表示
//!
//! 抽出の失敗はログのみで、手入力を妨げない。
//! 処理中の再実行は無視し、処理中にファイルが替わった場合は古い応答を破棄する。

use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// 抽出エンドポイント
pub const EXTRACTION_API_URL: &str = "/api/costs/extract";
/// multipartのフィールド名
pub const DOCUMENT_FIELD: &str = "document";
/// CSRFトークンのヘッダー名
pub const CSRF_HEADER: &str = "X-CSRF-TOKEN";
/// 抽出できるファイル形式
pub const EXTRACTABLE_TYPES: [&str; 3] = ["application/pdf", "image/png", "image/jpeg"];
/// 自動入力した欄に付けるクラス
pub const HIGHLIGHT_CLASS: &str = "extracted-field";
/// ハイライト表示時間
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(3000);
/// ボタンの通常ラベル
pub const EXTRACT_LABEL: &str = "Extract from Document";
/// ボタンの処理中ラベル
pub const EXTRACTING_LABEL: &str = "Extracting...";

/// 抽出結果（全項目任意、未知の項目は無視）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionResult {
    pub net_amount: Option<f64>,
    pub vat_amount: Option<f64>,
    pub gross_amount: Option<f64>,
    /// 税率（パーセント、例: 21）
    pub vat_rate: Option<f64>,
    /// ISO形式の日付
    pub invoice_date: Option<String>,
    pub invoice_reference: Option<String>,
    pub currency: Option<String>,
}

impl ExtractionResult {
    /// 1項目でも取れていれば true
    pub fn has_any_data(&self) -> bool {
        self.net_amount.is_some()
            || self.vat_amount.is_some()
            || self.gross_amount.is_some()
            || self.vat_rate.is_some()
            || self.invoice_date.is_some()
            || self.invoice_reference.is_some()
            || self.currency.is_some()
    }
}

/// 自動入力の対象欄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetField {
    VatRate,
    NetAmount,
    VatAmount,
    GrossAmount,
    IncurredOn,
    DocumentReference,
}

impl TargetField {
    pub const ALL: [TargetField; 6] = [
        TargetField::VatRate,
        TargetField::NetAmount,
        TargetField::VatAmount,
        TargetField::GrossAmount,
        TargetField::IncurredOn,
        TargetField::DocumentReference,
    ];

    /// 標準のフォーム要素ID
    pub fn default_id(&self) -> &'static str {
        match self {
            TargetField::VatRate => "vatRate",
            TargetField::NetAmount => "netAmount",
            TargetField::VatAmount => "vatAmount",
            TargetField::GrossAmount => "grossAmount",
            TargetField::IncurredOn => "incurredOn",
            TargetField::DocumentReference => "documentReference",
        }
    }
}

/// 1欄分の書き込み
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub target: TargetField,
    pub value: String,
}

/// パーセントを税率selectの値（小数2桁）に変換
pub fn rate_option_value(percentage: f64) -> String {
    format!("{:.2}", percentage / 100.0)
}

/// 抽出結果から書き込み内容を組み立てる
///
/// 税率は選択肢に一致するものがある場合だけ書き込む。
pub fn plan_autofill<P>(result: &ExtractionResult, has_rate_option: P) -> Vec<FieldUpdate>
where
    P: Fn(&str) -> bool,
{
    let mut updates = Vec::new();

    if let Some(rate) = result.vat_rate {
        let value = rate_option_value(rate);
        if has_rate_option(&value) {
            updates.push(FieldUpdate { target: TargetField::VatRate, value });
        }
    }

    let amounts = [
        (TargetField::NetAmount, result.net_amount),
        (TargetField::VatAmount, result.vat_amount),
        (TargetField::GrossAmount, result.gross_amount),
    ];
    for (target, amount) in amounts {
        if let Some(amount) = amount {
            updates.push(FieldUpdate { target, value: amount.to_string() });
        }
    }

    if let Some(date) = &result.invoice_date {
        updates.push(FieldUpdate { target: TargetField::IncurredOn, value: date.clone() });
    }
    if let Some(reference) = &result.invoice_reference {
        updates.push(FieldUpdate { target: TargetField::DocumentReference, value: reference.clone() });
    }

    updates
}

/// 抽出APIの呼び出し口
#[allow(async_fn_in_trait)]
pub trait ExtractionTransport {
    type Document;

    async fn extract(
        &self,
        document: &Self::Document,
        csrf_token: &str,
    ) -> Result<ExtractionResult, ExtractionError>;
}

/// フォーム側の操作
pub trait AutofillView {
    fn set_field(&mut self, target: TargetField, value: &str);

    /// 税率selectに該当する選択肢があるか
    fn has_rate_option(&self, value: &str) -> bool;

    /// ハイライトを付け、`HIGHLIGHT_DURATION` 後に外す（欄ごとに独立）
    fn highlight(&mut self, target: TargetField);

    fn set_extract_visible(&mut self, visible: bool);

    /// 処理中: ボタン無効＋`EXTRACTING_LABEL`、解除で有効＋`EXTRACT_LABEL`
    fn set_busy(&mut self, busy: bool);

    fn log_diagnostic(&mut self, message: &str);
}

/// 状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutofillState {
    Idle,
    Ready,
    Extracting,
}

/// 選択されたファイル
#[derive(Debug, Clone)]
pub struct SelectedFile<D> {
    pub media_type: String,
    pub document: D,
}

impl<D> SelectedFile<D> {
    pub fn new(media_type: impl Into<String>, document: D) -> Self {
        Self {
            media_type: media_type.into(),
            document,
        }
    }

    pub fn is_extractable(&self) -> bool {
        EXTRACTABLE_TYPES.contains(&self.media_type.as_str())
    }
}

/// 発行済みの抽出リクエスト
#[derive(Debug, Clone)]
pub struct PendingExtraction<D> {
    generation: u64,
    pub document: D,
}

/// 抽出の結末
#[derive(Debug, Clone, PartialEq)]
pub enum AutofillOutcome {
    /// 実行条件を満たさず何もしなかった
    Skipped,
    /// 書き込んだ欄の数
    Applied(usize),
    Failed(ExtractionError),
    /// 処理中にファイルが替わったため破棄
    Discarded,
}

/// 自動入力の状態機械
#[derive(Debug)]
pub struct AutofillClient<D> {
    state: AutofillState,
    file: Option<SelectedFile<D>>,
    /// ファイル選択ごとに増える
    generation: u64,
    csrf_token: String,
}

impl<D: Clone> AutofillClient<D> {
    pub fn new(csrf_token: impl Into<String>) -> Self {
        Self {
            state: AutofillState::Idle,
            file: None,
            generation: 0,
            csrf_token: csrf_token.into(),
        }
    }

    /// フォームに取り付けた直後の表示（ボタン非表示）
    pub fn attach<V: AutofillView>(&self, view: &mut V) {
        view.set_extract_visible(false);
    }

    pub fn state(&self) -> AutofillState {
        self.state
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// ファイル選択イベント
    pub fn select_file<V: AutofillView>(
        &mut self,
        file: Option<SelectedFile<D>>,
        view: &mut V,
    ) -> AutofillState {
        self.generation += 1;
        self.file = file.filter(SelectedFile::is_extractable);

        if self.state != AutofillState::Extracting {
            self.state = if self.file.is_some() {
                AutofillState::Ready
            } else {
                AutofillState::Idle
            };
        }
        view.set_extract_visible(self.file.is_some());

        debug!(state = ?self.state, generation = self.generation, "document selected");
        self.state
    }

    /// 抽出開始。`Ready` 以外では何もしない。
    pub fn begin_extraction<V: AutofillView>(&mut self, view: &mut V) -> Option<PendingExtraction<D>> {
        if self.state != AutofillState::Ready {
            debug!(state = ?self.state, "extraction trigger ignored");
            return None;
        }
        let document = self.file.as_ref()?.document.clone();

        self.state = AutofillState::Extracting;
        view.set_busy(true);

        Some(PendingExtraction {
            generation: self.generation,
            document,
        })
    }

    /// 応答を反映し、結果にかかわらず処理中表示を解除する
    pub fn finish_extraction<V: AutofillView>(
        &mut self,
        pending: PendingExtraction<D>,
        response: Result<ExtractionResult, ExtractionError>,
        view: &mut V,
    ) -> AutofillOutcome {
        let outcome = if pending.generation != self.generation {
            let message = "Extraction result discarded: document changed during extraction";
            warn!("{}", message);
            view.log_diagnostic(message);
            AutofillOutcome::Discarded
        } else {
            match response {
                Ok(result) => {
                    let updates = plan_autofill(&result, |value| view.has_rate_option(value));
                    for update in &updates {
                        view.set_field(update.target, &update.value);
                        view.highlight(update.target);
                    }
                    debug!(fields = updates.len(), "extraction applied");
                    AutofillOutcome::Applied(updates.len())
                }
                Err(e) => {
                    warn!(error = %e, "extraction failed");
                    view.log_diagnostic(&e.to_string());
                    AutofillOutcome::Failed(e)
                }
            }
        };

        self.state = if self.file.is_some() {
            AutofillState::Ready
        } else {
            AutofillState::Idle
        };
        view.set_busy(false);
        view.set_extract_visible(self.file.is_some());

        outcome
    }

    /// 開始から反映までをまとめて実行
    pub async fn extract_and_populate<T, V>(&mut self, transport: &T, view: &mut V) -> AutofillOutcome
    where
        T: ExtractionTransport<Document = D>,
        V: AutofillView,
    {
        let pending = match self.begin_extraction(view) {
            Some(p) => p,
            None => return AutofillOutcome::Skipped,
        };

        let response = transport.extract(&pending.document, &self.csrf_token).await;
        self.finish_extraction(pending, response, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MockForm {
        fields: HashMap<TargetField, String>,
        rate_options: Vec<&'static str>,
        highlights: Vec<TargetField>,
        busy: Vec<bool>,
        visible: bool,
        diagnostics: Vec<String>,
    }

    impl MockForm {
        fn new() -> Self {
            Self {
                rate_options: vec!["0.00", "0.09", "0.21", "0.25"],
                ..Default::default()
            }
        }

        fn value(&self, target: TargetField) -> &str {
            self.fields.get(&target).map(String::as_str).unwrap_or("")
        }
    }

    impl AutofillView for MockForm {
        fn set_field(&mut self, target: TargetField, value: &str) {
            self.fields.insert(target, value.to_string());
        }

        fn has_rate_option(&self, value: &str) -> bool {
            self.rate_options.contains(&value)
        }

        fn highlight(&mut self, target: TargetField) {
            self.highlights.push(target);
        }

        fn set_extract_visible(&mut self, visible: bool) {
            self.visible = visible;
        }

        fn set_busy(&mut self, busy: bool) {
            self.busy.push(busy);
        }

        fn log_diagnostic(&mut self, message: &str) {
            self.diagnostics.push(message.to_string());
        }
    }

    struct MockTransport {
        response: Result<ExtractionResult, ExtractionError>,
    }

    impl ExtractionTransport for MockTransport {
        type Document = &'static str;

        async fn extract(
            &self,
            _document: &&'static str,
            csrf_token: &str,
        ) -> Result<ExtractionResult, ExtractionError> {
            assert_eq!(csrf_token, "test-csrf-token");
            self.response.clone()
        }
    }

    fn pdf() -> Option<SelectedFile<&'static str>> {
        Some(SelectedFile::new("application/pdf", "invoice.pdf"))
    }

    #[test]
    fn test_attach_hides_button() {
        let client = AutofillClient::<&str>::new("test-csrf-token");
        let mut form = MockForm::new();
        form.visible = true;

        client.attach(&mut form);
        assert!(!form.visible);
        assert_eq!(client.state(), AutofillState::Idle);
    }

    #[test]
    fn test_unsupported_file_keeps_button_hidden() {
        let mut client = AutofillClient::new("test-csrf-token");
        let mut form = MockForm::new();

        let state = client.select_file(Some(SelectedFile::new("application/msword", "invoice.doc")), &mut form);
        assert_eq!(state, AutofillState::Idle);
        assert!(!form.visible);
    }

    #[test]
    fn test_supported_types_show_button() {
        for media_type in EXTRACTABLE_TYPES {
            let mut client = AutofillClient::new("test-csrf-token");
            let mut form = MockForm::new();

            assert_eq!(
                client.select_file(Some(SelectedFile::new(media_type, "scan")), &mut form),
                AutofillState::Ready
            );
            assert!(form.visible);
        }
    }

    #[test]
    fn test_clearing_file_returns_to_idle() {
        let mut client = AutofillClient::new("test-csrf-token");
        let mut form = MockForm::new();
        client.select_file(pdf(), &mut form);

        assert_eq!(client.select_file(None, &mut form), AutofillState::Idle);
        assert!(!form.visible);
    }

    #[test]
    fn test_successful_extraction_populates_fields() {
        let mut client = AutofillClient::new("test-csrf-token");
        let mut form = MockForm::new();
        let transport = MockTransport {
            response: Ok(serde_json::from_str(
                r#"{"netAmount": 100, "vatRate": 21, "vatAmount": 21, "grossAmount": 121, "confidence": 0.9}"#,
            )
            .unwrap()),
        };

        client.select_file(pdf(), &mut form);
        let outcome = block_on(client.extract_and_populate(&transport, &mut form));

        assert_eq!(outcome, AutofillOutcome::Applied(4));
        assert_eq!(form.value(TargetField::NetAmount), "100");
        assert_eq!(form.value(TargetField::VatAmount), "21");
        assert_eq!(form.value(TargetField::GrossAmount), "121");
        assert_eq!(form.value(TargetField::VatRate), "0.21");
        assert_eq!(form.value(TargetField::IncurredOn), "");
        assert_eq!(form.highlights.len(), 4);
        assert_eq!(form.busy, vec![true, false]);
        assert!(form.diagnostics.is_empty());
        assert_eq!(client.state(), AutofillState::Ready);
    }

    #[test]
    fn test_failed_extraction_leaves_fields_empty() {
        let mut client = AutofillClient::new("test-csrf-token");
        let mut form = MockForm::new();
        let transport = MockTransport {
            response: Err(ExtractionError::Status(500)),
        };

        client.select_file(pdf(), &mut form);
        let outcome = block_on(client.extract_and_populate(&transport, &mut form));

        assert_eq!(outcome, AutofillOutcome::Failed(ExtractionError::Status(500)));
        assert!(TargetField::ALL.iter().all(|t| form.value(*t).is_empty()));
        assert_eq!(form.diagnostics.len(), 1);
        assert_eq!(form.busy, vec![true, false]);
        assert!(form.visible);
        assert_eq!(client.state(), AutofillState::Ready);
    }

    #[test]
    fn test_trigger_without_file_is_skipped() {
        let mut client = AutofillClient::new("test-csrf-token");
        let mut form = MockForm::new();
        let transport = MockTransport {
            response: Ok(ExtractionResult::default()),
        };

        assert_eq!(
            block_on(client.extract_and_populate(&transport, &mut form)),
            AutofillOutcome::Skipped
        );
        assert!(form.busy.is_empty());
    }

    #[test]
    fn test_trigger_while_extracting_is_ignored() {
        let mut client = AutofillClient::new("test-csrf-token");
        let mut form = MockForm::new();
        client.select_file(pdf(), &mut form);

        let pending = client.begin_extraction(&mut form);
        assert!(pending.is_some());
        assert!(client.begin_extraction(&mut form).is_none());
        assert_eq!(form.busy, vec![true]);
    }

    #[test]
    fn test_file_change_discards_stale_response() {
        let mut client = AutofillClient::new("test-csrf-token");
        let mut form = MockForm::new();
        client.select_file(pdf(), &mut form);

        let pending = client.begin_extraction(&mut form).unwrap();
        assert_eq!(
            client.select_file(Some(SelectedFile::new("image/png", "other.png")), &mut form),
            AutofillState::Extracting
        );

        let outcome = client.finish_extraction(
            pending,
            Ok(ExtractionResult { net_amount: Some(5.0), ..Default::default() }),
            &mut form,
        );

        assert_eq!(outcome, AutofillOutcome::Discarded);
        assert_eq!(form.value(TargetField::NetAmount), "");
        assert_eq!(form.diagnostics.len(), 1);
        assert_eq!(form.busy, vec![true, false]);
        assert_eq!(client.state(), AutofillState::Ready);
    }

    #[test]
    fn test_file_removed_during_extraction_ends_idle() {
        let mut client = AutofillClient::new("test-csrf-token");
        let mut form = MockForm::new();
        client.select_file(pdf(), &mut form);

        let pending = client.begin_extraction(&mut form).unwrap();
        client.select_file(None, &mut form);
        client.finish_extraction(pending, Err(ExtractionError::Network("offline".into())), &mut form);

        assert_eq!(client.state(), AutofillState::Idle);
        assert!(!form.visible);
    }

    #[test]
    fn test_plan_skips_unknown_rate() {
        let result = ExtractionResult {
            vat_rate: Some(19.0),
            invoice_date: Some("2024-03-15".into()),
            invoice_reference: Some("INV-2024-001".into()),
            ..Default::default()
        };
        let updates = plan_autofill(&result, |v| v == "0.21");

        assert_eq!(
            updates,
            vec![
                FieldUpdate { target: TargetField::IncurredOn, value: "2024-03-15".into() },
                FieldUpdate { target: TargetField::DocumentReference, value: "INV-2024-001".into() },
            ]
        );
    }

    #[test]
    fn test_rate_option_value() {
        assert_eq!(rate_option_value(21.0), "0.21");
        assert_eq!(rate_option_value(9.0), "0.09");
        assert_eq!(rate_option_value(0.0), "0.00");
    }

    #[test]
    fn test_decimal_amounts_keep_fraction() {
        let updates = plan_autofill(
            &ExtractionResult { net_amount: Some(99.5), ..Default::default() },
            |_| true,
        );
        assert_eq!(updates[0].value, "99.5");
    }

    #[test]
    fn test_has_any_data() {
        assert!(!ExtractionResult::default().has_any_data());
        assert!(ExtractionResult { currency: Some("EUR".into()), ..Default::default() }.has_any_data());
    }
}
