//! Replace raw viewer links in user-facing text with short markdown labels

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// Visible label of the first masked link; later distinct links get " (n)".
pub const MASK_LABEL: &str = "Updated Neuroglancer view";

const VIEWER_MARKER: &str = "neuroglancer";

lazy_static! {
    // A full http(s) URL, or a bare percent-encoded state fragment.
    static ref LINK_RE: Regex =
        Regex::new(r#"https?://[^\s<>()\[\]"'`]+|#!%7B[^\s<>()\[\]"'`]*"#)
            .expect("link regex is valid");
}

/// Trailing punctuation that belongs to the sentence, not the URL
const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Link masker. Recognizes any URL containing the viewer marker substring,
/// any URL under a configured base, and bare state fragments.
#[derive(Debug, Clone, Default)]
pub struct LinkMasker {
    base_url: Option<String>,
}

impl LinkMasker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also treat links under `base_url` as viewer links, even when the host
    /// name does not contain the marker.
    pub fn for_base(base_url: impl Into<String>) -> Self {
        let base = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url: if base.is_empty() { None } else { Some(base) },
        }
    }

    fn is_viewer_link(&self, candidate: &str) -> bool {
        if candidate.starts_with("#!") {
            return true;
        }
        if candidate.to_lowercase().contains(VIEWER_MARKER) {
            return true;
        }
        match &self.base_url {
            Some(base) => candidate.starts_with(base.as_str()),
            None => false,
        }
    }

    /// Label for the n-th distinct link (1-based)
    pub fn label(n: usize) -> String {
        if n <= 1 {
            MASK_LABEL.to_string()
        } else {
            format!("{} ({})", MASK_LABEL, n)
        }
    }

    /// Markdown hyperlink form of a single link
    pub fn markdown(url: &str, n: usize) -> String {
        format!("[{}]({})", Self::label(n), url)
    }

    /// Mask every raw viewer link in `text`.
    ///
    /// Links already inside a markdown hyperlink target (`](url)`) are left
    /// alone.
    pub fn mask(&self, text: &str) -> String {
        let mut labels: HashMap<String, usize> = HashMap::new();
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for m in LINK_RE.find_iter(text) {
            let raw = m.as_str();
            let url = raw.trim_end_matches(TRAILING);
            if url.is_empty() || !self.is_viewer_link(url) {
                continue;
            }
            if text[..m.start()].ends_with("](") {
                continue;
            }
            let next = labels.len() + 1;
            let n = *labels.entry(url.to_string()).or_insert(next);

            out.push_str(&text[last..m.start()]);
            out.push_str(&Self::markdown(url, n));
            last = m.start() + url.len();
        }

        if last == 0 && labels.is_empty() {
            return text.to_string();
        }
        out.push_str(&text[last..]);
        out
    }
}

/// Mask with the default recognizer
pub fn mask_viewer_links(text: &str) -> String {
    LinkMasker::new().mask(text)
}
