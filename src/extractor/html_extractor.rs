//! Page evidence taken from markup: `<script src>` values and `<meta>` pairs.
//!
//! The html5ever tokenizer is enough here, no tree is built. Broken markup
//! never fails, it only yields less evidence.

use std::cell::RefCell;
use std::collections::HashMap;

use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

/// Script sources in document order and meta tags keyed by lowercase name
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageEvidence {
    pub script_srcs: Vec<String>,
    /// `name` or `property` -> `content`; the first tag with a given name wins
    pub metas: HashMap<String, String>,
}

impl PageEvidence {
    pub fn from_html(html: &str) -> Self {
        let tokenizer = Tokenizer::new(EvidenceSink::default(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink.evidence.into_inner()
    }

    fn record_script(&mut self, attrs: &[Attribute]) {
        let src = attrs
            .iter()
            .find(|attr| attr.name.local.as_ref() == "src")
            .map(|attr| attr.value.trim())
            .filter(|src| !src.is_empty());
        if let Some(src) = src {
            self.script_srcs.push(src.to_string());
        }
    }

    fn record_meta(&mut self, attrs: &[Attribute]) {
        let value_of = |key: &str| {
            attrs
                .iter()
                .find(|attr| attr.name.local.as_ref() == key)
                .map(|attr| attr.value.to_string())
        };

        let Some(content) = value_of("content") else {
            return;
        };
        if let Some(name) = value_of("name").or_else(|| value_of("property")) {
            self.metas.entry(name.to_lowercase()).or_insert(content);
        }
    }
}

#[derive(Default)]
struct EvidenceSink {
    evidence: RefCell<PageEvidence>,
}

impl TokenSink for EvidenceSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag { kind: TagKind::StartTag, name, attrs, .. }) = token {
            match name.as_ref() {
                "script" => self.evidence.borrow_mut().record_script(&attrs),
                "meta" => self.evidence.borrow_mut().record_meta(&attrs),
                _ => {}
            }
        }
        TokenSinkResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_and_metas() {
        let html = r#"
            <script src="/jquery.min.js"></script>
            <meta name="author" content="test_user">
            <meta name="Generator" content="WordPress 6.0" />
            <meta property="og:site_name" content="Example">
            <script>var inline = 1;</script>
            <script src="  "></script>
            <script src="/vue.global.js"></script>
        "#;

        let evidence = PageEvidence::from_html(html);

        assert_eq!(evidence.script_srcs, vec!["/jquery.min.js".to_string(), "/vue.global.js".to_string()]);
        assert_eq!(evidence.metas.len(), 3);
        assert_eq!(evidence.metas["generator"], "WordPress 6.0");
        assert_eq!(evidence.metas["og:site_name"], "Example");
    }

    #[test]
    fn test_first_meta_name_wins() {
        let html = r#"<meta name="generator" content="Hugo 0.120"><meta name="GENERATOR" content="Jekyll">"#;
        let evidence = PageEvidence::from_html(html);
        assert_eq!(evidence.metas["generator"], "Hugo 0.120");
    }

    #[test]
    fn test_meta_without_content_is_ignored() {
        let evidence = PageEvidence::from_html(r#"<meta name="viewport"><meta charset="utf-8">"#);
        assert!(evidence.metas.is_empty());
    }

    #[test]
    fn test_broken_markup_yields_partial_evidence() {
        let evidence = PageEvidence::from_html("<html><head><meta name=x <script src='a.js'");
        assert!(evidence.metas.len() <= 1);
        assert!(evidence.script_srcs.len() <= 1);
    }
}
