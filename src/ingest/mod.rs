// src/ingest/mod.rs
pub mod config;
pub mod feed;
pub mod filter;
pub mod types;

/// Turn an RSS description into a plain-text snippet: decode entities,
/// strip tags, normalize quotes, collapse whitespace.
pub fn normalize_snippet(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags (block-level closers become spaces so words don't glue)
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace (incl. NBSP left over from decoding)
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"[\s\u{00A0}]+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_collapses_ws() {
        let s = "<p>Van der Poel&nbsp;&nbsp;wint</p><p>in  Roubaix</p>";
        assert_eq!(normalize_snippet(s), "Van der Poel wint in Roubaix");
    }

    #[test]
    fn keeps_sentence_punctuation() {
        assert_eq!(normalize_snippet("Wat een rit!"), "Wat een rit!");
    }

    #[test]
    fn normalizes_curly_quotes() {
        assert_eq!(
            normalize_snippet("\u{201C}Geweldig\u{201D}, zei hij"),
            "\"Geweldig\", zei hij"
        );
    }
}
