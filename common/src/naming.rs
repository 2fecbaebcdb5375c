//! フィールド命名規約
//!
//! サーバー側のフォームバインディングが読む形式:
//! - name: `<collection>[<index>].<field>`
//! - id:   `<collection><index>.<field>`
//!
//! 行削除後の番号振り直しは、この規約の添字部分だけを書き換え、
//! 末尾のフィールド名はそのまま残す。

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NAME_INDEX: Regex = Regex::new(r"\[\d+\]").expect("valid index pattern");
    static ref ID_INDEX: Regex = Regex::new(r"^([A-Za-z_]+)\d+\.").expect("valid id pattern");
    static ref FIELD_SUFFIX: Regex = Regex::new(r"\.(\w+)$").expect("valid suffix pattern");
}

/// `lineItems[0].quantity` 形式のname
pub fn field_name(collection: &str, index: usize, field: &str) -> String {
    format!("{}[{}].{}", collection, index, field)
}

/// `lineItems0.quantity` 形式のid
pub fn field_id(collection: &str, index: usize, field: &str) -> String {
    format!("{}{}.{}", collection, index, field)
}

/// 末尾のフィールド名（`.quantity` の `quantity`）
pub fn field_suffix(name: &str) -> Option<&str> {
    FIELD_SUFFIX
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// nameの最初の `[n]` を `[index]` に置き換える
pub fn renumber_name(name: &str, index: usize) -> String {
    NAME_INDEX
        .replace(name, format!("[{}]", index).as_str())
        .into_owned()
}

/// idの添字を置き換える。添字を含まないidはそのまま返す。
pub fn renumber_id(id: &str, index: usize) -> String {
    ID_INDEX
        .replace(id, |caps: &regex::Captures| format!("{}{}.", &caps[1], index))
        .into_owned()
}
