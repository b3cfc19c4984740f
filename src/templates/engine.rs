use minijinja::{AutoEscape, Environment};

use super::helpers;
use crate::core::error::DocumentResult;

/// Merges a substitution mapping into `word/document.xml` using MiniJinja.
/// Rendered values are XML-escaped; unknown placeholders render empty.
pub struct RenderEngine {
    env: Environment<'static>,
}

impl RenderEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        // OOXML is XML, which HTML escaping covers.
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        env.add_function("format_date", helpers::format_date);
        env.add_function("format_number", helpers::format_number);
        env.add_filter("money", helpers::money_filter);
        env.add_filter("date", helpers::date_filter);

        RenderEngine { env }
    }

    pub fn render(&self, document_xml: &str, data: &serde_json::Value) -> DocumentResult<String> {
        let normalized = normalize_placeholders(document_xml);
        Ok(self.env.render_str(&normalized, data)?)
    }
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Word splits text into runs at arbitrary points, so a placeholder typed as
/// `{{ name }}` frequently arrives as `{{ na</w:t>…<w:t>me }}`. This strips
/// the XML tags between the opening and closing delimiters; the removed run
/// boundaries pair up, leaving the surrounding markup balanced.
fn normalize_placeholders(xml: &str) -> String {
    let bytes = xml.as_bytes();
    let mut out = String::with_capacity(xml.len());
    let mut i = 0;

    while i < xml.len() {
        if bytes[i] == b'{' && i + 1 < xml.len() && (bytes[i + 1] == b'{' || bytes[i + 1] == b'%') {
            let close = if bytes[i + 1] == b'{' { b'}' } else { b'%' };
            if let Some(end) = placeholder_end(xml, i + 2, close) {
                strip_tags_into(&xml[i..end], &mut out);
                i = end;
                continue;
            }
        }

        let ch = xml[i..].chars().next().unwrap_or('\u{fffd}');
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// Finds the byte index just past the closing delimiter of a placeholder
/// opened before `from`. The delimiter itself may be split across runs, so
/// the closing pair is matched on the text with tags skipped. Placeholders
/// never span paragraphs; an unterminated one stops at `</w:p>` and is left
/// for the renderer to report.
fn placeholder_end(xml: &str, from: usize, close: u8) -> Option<usize> {
    let bytes = xml.as_bytes();
    let mut in_tag = false;
    let mut tag_start = 0usize;
    let mut prev = 0u8;

    for i in from..bytes.len() {
        let b = bytes[i];
        if in_tag {
            if b == b'>' {
                if &xml[tag_start..i] == "/w:p" {
                    return None;
                }
                in_tag = false;
            }
        } else if b == b'<' {
            in_tag = true;
            tag_start = i + 1;
        } else {
            if b == b'}' && prev == close {
                return Some(i + 1);
            }
            prev = b;
        }
    }

    None
}

fn strip_tags_into(span: &str, out: &mut String) {
    let mut in_tag = false;
    for ch in span.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
}
