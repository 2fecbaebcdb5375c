//! HTMLエスケープ
//!
//! 行フラグメントに埋め込むユーザー入力（アーティスト名・リリース名など）は
//! 必ずここを通す。

/// テキストノード用エスケープ（`& < > "`）
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// 属性値用エスケープ（`'` も対象）
pub fn escape_attr(text: &str) -> String {
    escape_html(text).replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & more</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; more&lt;/script&gt;"
        );
    }

    #[test]
    fn test_escape_html_keeps_apostrophe() {
        assert_eq!(escape_html("Rock'n'Roll"), "Rock'n'Roll");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("Rock'n'Roll"), "Rock&#39;n&#39;Roll");
        assert_eq!(escape_attr("a\"b"), "a&quot;b");
    }

    #[test]
    fn test_escape_plain_text_unchanged() {
        assert_eq!(escape_html("DJ Ötzi"), "DJ Ötzi");
    }
}
