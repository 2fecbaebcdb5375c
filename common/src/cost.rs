//! コスト入力の整合性チェックとフォームモデル
//!
//! - `validate_cost`: 税抜・税率・税額・税込の整合性（純関数）
//! - `CostForm`: 新規登録フォーム／編集モーダルの値保持と送信ガード

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 許容誤差（絶対値）
pub const AMOUNT_TOLERANCE: f64 = 0.01;

lazy_static! {
    static ref LEADING_NUMBER: Regex =
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid number pattern");
}

/// コスト1件分の金額
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEntry {
    pub net_amount: f64,
    /// 税率（小数、例: 0.21）
    pub vat_rate: f64,
    pub vat_amount: f64,
    pub gross_amount: f64,
}

impl CostEntry {
    pub fn validate(&self) -> Vec<String> {
        validate_cost(self.net_amount, self.vat_rate, self.vat_amount, self.gross_amount)
    }
}

/// 小数点以下2桁に丸める
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 金額の整合性をチェックしてエラーメッセージを返す
///
/// 税額エラー → 税込エラーの順。整合していれば空。
///
/// # Examples
/// ```
/// use label_forms_common::validate_cost;
///
/// assert!(validate_cost(100.0, 0.21, 21.0, 121.0).is_empty());
/// assert_eq!(validate_cost(100.0, 0.21, 25.0, 125.0).len(), 1);
/// ```
pub fn validate_cost(net_amount: f64, vat_rate: f64, vat_amount: f64, gross_amount: f64) -> Vec<String> {
    let mut errors = Vec::new();

    let expected_vat = round2(net_amount * vat_rate);
    let expected_gross = round2(net_amount + vat_amount);

    if (vat_amount - expected_vat).abs() > AMOUNT_TOLERANCE {
        errors.push(format!(
            "VAT amount ({:.2}) should be {:.2} (net × rate)",
            vat_amount, expected_vat
        ));
    }

    if (gross_amount - expected_gross).abs() > AMOUNT_TOLERANCE {
        errors.push(format!(
            "Gross amount ({:.2}) should be {:.2} (net + VAT)",
            gross_amount, expected_gross
        ));
    }

    errors
}

/// 入力欄の文字列を金額として読む
///
/// 先頭の数値部分だけを読み、読めなければ 0。
pub fn parse_amount(raw: &str) -> f64 {
    LEADING_NUMBER
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// 編集ボタンの data 属性から渡される既存コスト
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostData {
    pub cost_id: Option<String>,
    pub cost_type: Option<String>,
    pub description: Option<String>,
    pub incurred_on: Option<String>,
    pub net_amount: Option<String>,
    pub vat_amount: Option<String>,
    pub vat_rate: Option<String>,
    pub gross_amount: Option<String>,
    pub document_reference: Option<String>,
}

/// 送信時の判定
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitDecision {
    Proceed,
    Block(Vec<String>),
}

/// コストフォームの入力値
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostForm {
    pub cost_type: String,
    pub description: String,
    pub incurred_on: String,
    pub net_amount: String,
    pub vat_amount: String,
    pub vat_rate: String,
    pub gross_amount: String,
    pub document_reference: String,
}

impl CostForm {
    pub fn entry(&self) -> CostEntry {
        CostEntry {
            net_amount: parse_amount(&self.net_amount),
            vat_rate: parse_amount(&self.vat_rate),
            vat_amount: parse_amount(&self.vat_amount),
            gross_amount: parse_amount(&self.gross_amount),
        }
    }

    pub fn validate(&self) -> Vec<String> {
        self.entry().validate()
    }

    /// 送信ガード。値は変更しない。
    pub fn on_submit(&self) -> SubmitDecision {
        let errors = self.validate();
        if errors.is_empty() {
            SubmitDecision::Proceed
        } else {
            SubmitDecision::Block(errors)
        }
    }

    /// 既存コストで全項目を上書きする（欠損は空文字）
    pub fn populate(&mut self, data: &CostData) {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        self.cost_type = value(&data.cost_type);
        self.description = value(&data.description);
        self.incurred_on = value(&data.incurred_on);
        self.net_amount = value(&data.net_amount);
        self.vat_amount = value(&data.vat_amount);
        self.vat_rate = value(&data.vat_rate);
        self.gross_amount = value(&data.gross_amount);
        self.document_reference = value(&data.document_reference);
    }
}

/// 編集フォームの送信先URL（`{costId}` を置換）
pub fn edit_action_url(template: &str, cost_id: &str) -> String {
    template.replace("{costId}", cost_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistent_values_have_no_errors() {
        for &(net, rate) in &[(100.0, 0.21), (19.99, 0.09), (1234.56, 0.25), (0.0, 0.21), (7.77, 0.0)] {
            let vat = round2(net * rate);
            let gross = round2(net + vat);
            assert!(validate_cost(net, rate, vat, gross).is_empty(), "net={} rate={}", net, rate);
        }
    }

    #[test]
    fn test_wrong_vat_amount() {
        let errors = validate_cost(100.0, 0.21, 25.0, 125.0);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("VAT amount"));
        assert!(errors[0].contains("21.00"));
        assert!(errors[0].contains("25.00"));
    }

    #[test]
    fn test_wrong_gross_amount() {
        let errors = validate_cost(100.0, 0.21, 21.0, 130.0);
        assert_eq!(errors, vec!["Gross amount (130.00) should be 121.00 (net + VAT)".to_string()]);
    }

    #[test]
    fn test_both_errors_vat_first() {
        let errors = validate_cost(100.0, 0.21, 30.0, 200.0);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("VAT amount"));
        assert!(errors[1].starts_with("Gross amount"));
    }

    #[test]
    fn test_within_tolerance() {
        assert!(validate_cost(100.0, 0.21, 21.004, 121.0).is_empty());
        assert!(validate_cost(100.0, 0.21, 21.0, 121.009).is_empty());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100"), 100.0);
        assert_eq!(parse_amount(" 12.50 EUR"), 12.5);
        assert_eq!(parse_amount(".5"), 0.5);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("abc"), 0.0);
    }

    #[test]
    fn test_submit_guard_blocks_without_mutating() {
        let form = CostForm {
            net_amount: "100".into(),
            vat_rate: "0.21".into(),
            vat_amount: "25".into(),
            gross_amount: "125".into(),
            ..Default::default()
        };
        let before = form.clone();

        match form.on_submit() {
            SubmitDecision::Block(errors) => assert_eq!(errors.len(), 1),
            SubmitDecision::Proceed => panic!("expected submission to be blocked"),
        }
        assert_eq!(form, before);
    }

    #[test]
    fn test_empty_form_proceeds() {
        assert_eq!(CostForm::default().on_submit(), SubmitDecision::Proceed);
    }

    #[test]
    fn test_populate_from_cost_data() {
        let data: CostData = serde_json::from_str(
            r#"{"costId": "42", "costType": "MASTERING", "netAmount": "100.00", "vatRate": "0.21"}"#,
        )
        .unwrap();

        let mut form = CostForm {
            description: "stale".into(),
            ..Default::default()
        };
        form.populate(&data);

        assert_eq!(form.cost_type, "MASTERING");
        assert_eq!(form.net_amount, "100.00");
        assert_eq!(form.vat_rate, "0.21");
        assert_eq!(form.description, "");
        assert_eq!(
            edit_action_url("/labels/1/costs/{costId}/edit", data.cost_id.as_deref().unwrap()),
            "/labels/1/costs/42/edit"
        );
    }
}
