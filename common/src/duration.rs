//! トラック長の表示変換
//!
//! 秒数 ⇔ `M:SS` 文字列。クライアントは表示・プリフィル用に
//! `format_duration` のみ使い、`parse_duration` はサーバー側の
//! バインディングと同じ規則でCLIから使う。

use crate::error::{Error, Result};

/// 秒数を `M:SS` に変換する
///
/// `None` は空文字列、`0` は `"0:00"`。
///
/// # Examples
/// ```
/// use label_forms_common::format_duration;
///
/// assert_eq!(format_duration(Some(754)), "12:34");
/// assert_eq!(format_duration(None), "");
/// ```
pub fn format_duration(total_seconds: Option<u32>) -> String {
    match total_seconds {
        None => String::new(),
        Some(0) => "0:00".to_string(),
        Some(s) => format!("{}:{:02}", s / 60, s % 60),
    }
}

/// `M:SS` 文字列を秒数に変換する
///
/// 空白のみは `0`。コロン区切りの2要素でなければエラー。
pub fn parse_duration(mmss: &str) -> Result<u32> {
    let trimmed = mmss.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() != 2 {
        return Err(Error::InvalidDuration(mmss.to_string()));
    }

    let minutes: u32 = parts[0]
        .parse()
        .map_err(|_| Error::InvalidDuration(mmss.to_string()))?;
    let seconds: u32 = parts[1]
        .parse()
        .map_err(|_| Error::InvalidDuration(mmss.to_string()))?;

    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(|| Error::InvalidDuration(mmss.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_zero() {
        assert_eq!(format_duration(Some(0)), "0:00");
    }

    #[test]
    fn test_format_under_a_minute_pads_seconds() {
        assert_eq!(format_duration(Some(5)), "0:05");
        assert_eq!(format_duration(Some(45)), "0:45");
    }

    #[test]
    fn test_format_minutes_and_seconds() {
        assert_eq!(format_duration(Some(60)), "1:00");
        assert_eq!(format_duration(Some(185)), "3:05");
        assert_eq!(format_duration(Some(600)), "10:00");
        assert_eq!(format_duration(Some(754)), "12:34");
    }

    #[test]
    fn test_format_none_is_empty() {
        assert_eq!(format_duration(None), "");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("3:05").unwrap(), 185);
        assert_eq!(parse_duration("12:34").unwrap(), 754);
        assert_eq!(parse_duration("  ").unwrap(), 0);
    }

    #[test]
    fn test_parse_duration_rejects_other_shapes() {
        assert!(matches!(parse_duration("305"), Err(Error::InvalidDuration(_))));
        assert!(parse_duration("1:2:3").is_err());
        assert!(parse_duration("a:05").is_err());
    }
}
