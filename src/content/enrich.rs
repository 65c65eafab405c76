//! Read-time rendering of stored post and comment text.
//!
//! Stored text is never modified; every read runs it through
//! [`Enricher::render`]: HTML escaping, then emoticon substitution outside
//! URLs, then autolinking.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::emoticon::EmoticonSet;

/// A URL token: `http://` or `https://` at the start of the text or after
/// whitespace, running to the next whitespace.
const LINK_PATTERN: &str = r"(^|\s)(https?://\S+)";

/// Spans emoticon substitution leaves alone: existing anchors and URL tokens.
const VERBATIM_PATTERN: &str = r"(?s)(<a\s[^>]*>.*?</a>)|(?:^|\s)(https?://\S+)";

fn link_regex() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| Regex::new(LINK_PATTERN).expect("link pattern compiles"))
}

fn verbatim_regex() -> &'static Regex {
    static VERBATIM: OnceLock<Regex> = OnceLock::new();
    VERBATIM.get_or_init(|| Regex::new(VERBATIM_PATTERN).expect("verbatim pattern compiles"))
}

/// Escape `& < > " '`.
///
/// `/` is left alone so escaped URLs stay recognizable.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

/// Wrap each whitespace-delimited `http(s)://` token in an anchor.
///
/// Whitespace is preserved. Tokens inside existing markup (for example an
/// `href="..."` attribute) do not start after whitespace and are left alone,
/// so linked text is never wrapped twice.
pub fn autolink(text: &str) -> String {
    link_regex()
        .replace_all(text, |caps: &Captures<'_>| {
            let url = &caps[2];
            format!(r#"{}<a href="{url}" target="_blank">{url}</a>"#, &caps[1])
        })
        .into_owned()
}

/// Renders stored text for display.
#[derive(Debug, Clone)]
pub struct Enricher {
    emoticons: EmoticonSet,
    emoticon_prefix: String,
}

impl Enricher {
    pub fn new(emoticons: EmoticonSet, emoticon_prefix: impl Into<String>) -> Self {
        Self {
            emoticons,
            emoticon_prefix: emoticon_prefix.into(),
        }
    }

    pub fn emoticons(&self) -> &EmoticonSet {
        &self.emoticons
    }

    /// Render `raw` for display. With `raw_markup` the escaping step is
    /// skipped; only moderators can store such text.
    pub fn render(&self, raw: &str, raw_markup: bool) -> String {
        if raw_markup {
            self.decorate(raw)
        } else {
            self.decorate(&escape_html(raw))
        }
    }

    /// Apply emoticons and links to text that is already display-safe.
    ///
    /// Emoticon tokens inside URLs and existing anchors are left as they are,
    /// so a link never has markup spliced into it. Running this on its own
    /// output changes nothing, provided the output contains no further
    /// registered `:name:` tokens.
    pub fn decorate(&self, display_text: &str) -> String {
        let mut with_emoticons = String::with_capacity(display_text.len());
        let mut last = 0;
        for caps in verbatim_regex().captures_iter(display_text) {
            let Some(span) = caps.get(1).or_else(|| caps.get(2)) else {
                continue;
            };
            with_emoticons.push_str(&self.emoticons.replace_tokens(
                &display_text[last..span.start()],
                &self.emoticon_prefix,
            ));
            with_emoticons.push_str(span.as_str());
            last = span.end();
        }
        with_emoticons.push_str(
            &self
                .emoticons
                .replace_tokens(&display_text[last..], &self.emoticon_prefix),
        );
        autolink(&with_emoticons)
    }
}
