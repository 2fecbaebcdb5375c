//! 請求書抽出（ネイティブ版）のテスト
//!
//! HTTPは使わず、抽出APIの応答を差し替えて検証

use label_forms::error::LabelFormsError;
use label_forms::extract::{extract_document, media_type_for, ConsoleForm, LocalDocument};
use label_forms_common::{
    AutofillOutcome, ExtractionError, ExtractionResult, ExtractionTransport, TargetField,
};
use std::path::Path;
use tempfile::tempdir;

struct StubTransport {
    response: Result<ExtractionResult, ExtractionError>,
}

impl ExtractionTransport for StubTransport {
    type Document = LocalDocument;

    async fn extract(
        &self,
        document: &LocalDocument,
        csrf_token: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        assert_eq!(csrf_token, "csrf");
        assert!(!document.bytes.is_empty());
        self.response.clone()
    }
}

fn rate_options() -> Vec<String> {
    vec!["0.00".into(), "0.09".into(), "0.21".into()]
}

#[test]
fn test_media_type_for() {
    assert_eq!(media_type_for(Path::new("invoice.PDF")), "application/pdf");
    assert_eq!(media_type_for(Path::new("scan.jpg")), "image/jpeg");
    assert_eq!(media_type_for(Path::new("scan.jpeg")), "image/jpeg");
    assert_eq!(media_type_for(Path::new("scan.png")), "image/png");
    assert_eq!(media_type_for(Path::new("letter.doc")), "application/msword");
    assert_eq!(media_type_for(Path::new("noext")), "application/octet-stream");
}

#[tokio::test]
async fn test_extract_fills_form() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = dir.path().join("invoice.pdf");
    std::fs::write(&file, b"%PDF-1.4").unwrap();

    let transport = StubTransport {
        response: Ok(ExtractionResult {
            net_amount: Some(100.0),
            vat_rate: Some(21.0),
            vat_amount: Some(21.0),
            gross_amount: Some(121.0),
            invoice_date: Some("2024-03-15".into()),
            invoice_reference: Some("INV-001".into()),
            currency: Some("EUR".into()),
        }),
    };
    let mut form = ConsoleForm::new(rate_options());

    let outcome = extract_document(&transport, &file, "csrf", &mut form).await.unwrap();

    assert_eq!(outcome, AutofillOutcome::Applied(6));
    assert_eq!(form.value(TargetField::NetAmount), Some("100"));
    assert_eq!(form.value(TargetField::VatRate), Some("0.21"));
    assert_eq!(form.value(TargetField::GrossAmount), Some("121"));
    assert_eq!(form.value(TargetField::IncurredOn), Some("2024-03-15"));
    assert_eq!(form.value(TargetField::DocumentReference), Some("INV-001"));
    assert_eq!(form.highlighted().len(), 6);
    assert!(!form.is_busy());
}

#[tokio::test]
async fn test_extract_failure_is_reported_once() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = dir.path().join("scan.png");
    std::fs::write(&file, b"png").unwrap();

    let transport = StubTransport {
        response: Err(ExtractionError::Status(422)),
    };
    let mut form = ConsoleForm::new(rate_options());

    let outcome = extract_document(&transport, &file, "csrf", &mut form).await.unwrap();

    assert_eq!(outcome, AutofillOutcome::Failed(ExtractionError::Status(422)));
    assert!(form.fields().is_empty());
    assert_eq!(form.diagnostics(), &["Extraction failed: 422".to_string()]);
    assert!(!form.is_busy());
}

#[tokio::test]
async fn test_unsupported_document_is_rejected() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = dir.path().join("letter.doc");
    std::fs::write(&file, b"doc").unwrap();

    let transport = StubTransport {
        response: Ok(ExtractionResult::default()),
    };
    let mut form = ConsoleForm::new(rate_options());

    let result = extract_document(&transport, &file, "csrf", &mut form).await;

    assert!(matches!(result, Err(LabelFormsError::UnsupportedDocument(_))));
    assert!(!form.is_extract_visible());
}

#[tokio::test]
async fn test_missing_file_is_error() {
    let transport = StubTransport {
        response: Ok(ExtractionResult::default()),
    };
    let mut form = ConsoleForm::new(rate_options());

    let result = extract_document(&transport, Path::new("/nonexistent/invoice.pdf"), "csrf", &mut form).await;

    assert!(matches!(result, Err(LabelFormsError::FileNotFound(_))));
}

#[tokio::test]
async fn test_unreadable_file_is_io_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    // 存在はするが読めない（ディレクトリ）
    let file = dir.path().join("invoice.pdf");
    std::fs::create_dir(&file).unwrap();

    let transport = StubTransport {
        response: Ok(ExtractionResult::default()),
    };
    let mut form = ConsoleForm::new(rate_options());

    let result = extract_document(&transport, &file, "csrf", &mut form).await;

    assert!(matches!(result, Err(LabelFormsError::Io(_))));
    assert!(!form.is_busy());
    assert!(form.diagnostics().is_empty());
}

#[tokio::test]
async fn test_load_reads_document_bytes() {
    let dir = tempdir().expect("Failed to create temp dir");
    let file = dir.path().join("scan.jpeg");
    std::fs::write(&file, b"jpeg-bytes").unwrap();

    let document = LocalDocument::load(&file).await.unwrap();

    assert_eq!(document.bytes, b"jpeg-bytes");
    assert_eq!(document.media_type, "image/jpeg");
}
