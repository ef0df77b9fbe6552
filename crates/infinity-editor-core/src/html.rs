//! Markup reader and writer for editor content.
//!
//! The content handed to hosts is HTML-like markup, one `<p>` per paragraph
//! with inline formatting tags. `write_html` is the only producer of that
//! markup; `parse_html` reads it back, along with the looser markup a
//! browser's content-editable surface or an older caller may hand over.
//!
//! # Serialization
//!
//! - each paragraph becomes `<p>…</p>`, an empty one `<p><br></p>`
//! - an empty document is the empty string
//! - every run opens `<b>`, `<i>`, `<u>`, `<s>` (in that order) and then a
//!   single `<span style>` for the CSS-valued properties

use std::fmt::{self, Write as _};

use markdown_weaver_escape::{FmtWriter, escape_html, escape_html_body_text};
use smol_str::SmolStr;

use crate::style::{StyleRun, StyleRuns, TextStyle};
use crate::text::RichTextBuffer;

/// Legacy `<font size>` / `fontSize` steps, 1 through 7.
pub const LEGACY_FONT_SIZES: [&str; 7] = ["10px", "13px", "16px", "18px", "24px", "32px", "48px"];

/// Map a legacy font size step (`"1"`..`"7"`) to its CSS length.
pub fn legacy_font_size(step: &str) -> Option<&'static str> {
    let n: usize = step.trim().parse().ok()?;
    LEGACY_FONT_SIZES.get(n.checked_sub(1)?).copied()
}

/// Text plus a style table covering it, as read from markup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedContent {
    pub text: String,
    pub styles: StyleRuns,
}

// === Writer ===

/// Serialize a rich buffer to markup.
pub fn write_html<T: RichTextBuffer + ?Sized>(buffer: &T) -> String {
    let mut out = String::new();
    if let Err(e) = write_paragraphs(&mut out, buffer) {
        tracing::error!(target: "infinity::html", error = %e, "failed to serialize content");
    }
    out
}

type Segment = (String, TextStyle);

fn collect_paragraphs<T: RichTextBuffer + ?Sized>(buffer: &T) -> Vec<Vec<Segment>> {
    let len = buffer.len_chars();
    let text = buffer.to_string();
    let mut chars = text.chars();
    let mut paragraphs: Vec<Vec<Segment>> = vec![Vec::new()];

    for run in buffer.style_runs(0..len) {
        let mut segment = String::new();
        for _ in 0..run.len {
            match chars.next() {
                Some('\n') => {
                    if !segment.is_empty() {
                        let done = std::mem::take(&mut segment);
                        if let Some(para) = paragraphs.last_mut() {
                            para.push((done, run.style.clone()));
                        }
                    }
                    paragraphs.push(Vec::new());
                }
                Some(c) => segment.push(c),
                None => break,
            }
        }
        if !segment.is_empty() {
            if let Some(para) = paragraphs.last_mut() {
                para.push((segment, run.style.clone()));
            }
        }
    }
    paragraphs
}

fn write_paragraphs<T: RichTextBuffer + ?Sized>(out: &mut String, buffer: &T) -> fmt::Result {
    if buffer.is_empty() {
        return Ok(());
    }
    for para in collect_paragraphs(buffer) {
        out.push_str("<p>");
        if para.is_empty() {
            out.push_str("<br>");
        }
        let mut prev = None;
        let last = para.len().saturating_sub(1);
        for (i, (text, style)) in para.iter().enumerate() {
            write_segment(out, text, style, &mut prev, i == last)?;
        }
        out.push_str("</p>");
    }
    Ok(())
}

fn write_segment(
    out: &mut String,
    text: &str,
    style: &TextStyle,
    prev: &mut Option<char>,
    ends_paragraph: bool,
) -> fmt::Result {
    let flags = [
        (style.bold, "b"),
        (style.italic, "i"),
        (style.underline, "u"),
        (style.strikethrough, "s"),
    ];
    for (on, tag) in flags {
        if on {
            write!(out, "<{tag}>")?;
        }
    }
    let css = inline_css(style);
    if !css.is_empty() {
        out.push_str("<span style=\"");
        escape_html(FmtWriter(&mut *out), &css)?;
        out.push_str("\">");
    }

    write_text(out, text, prev, ends_paragraph)?;

    if !css.is_empty() {
        out.push_str("</span>");
    }
    for (on, tag) in flags.iter().rev() {
        if *on {
            write!(out, "</{tag}>")?;
        }
    }
    Ok(())
}

/// Write body text so that `parse_html` reads back the same chars.
///
/// Readers collapse whitespace, so a space at either end of a paragraph or
/// after other whitespace is written as `&nbsp;`, and whitespace other than
/// a space as a numeric reference.
fn write_text(
    out: &mut String,
    text: &str,
    prev: &mut Option<char>,
    ends_paragraph: bool,
) -> fmt::Result {
    let mut plain_start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let at_end = ends_paragraph && chars.peek().is_none();
        let hard = match c {
            ' ' => at_end || prev.is_none_or(|p| p.is_ascii_whitespace()),
            c => c.is_ascii_whitespace(),
        };
        if hard {
            escape_html_body_text(FmtWriter(&mut *out), &text[plain_start..i])?;
            match c {
                ' ' => out.push_str("&nbsp;"),
                c => write!(out, "&#{};", u32::from(c))?,
            }
            plain_start = i + c.len_utf8();
        }
        *prev = Some(c);
    }
    escape_html_body_text(FmtWriter(&mut *out), &text[plain_start..])
}

fn inline_css(style: &TextStyle) -> String {
    let props = [
        ("font-family", &style.font_family),
        ("font-size", &style.font_size),
        ("color", &style.color),
        ("background-color", &style.background),
    ];
    props
        .iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{name}: {v}")))
        .collect::<Vec<_>>()
        .join("; ")
}

// === Reader ===

/// Read markup (or plain text) into text and styles.
///
/// Never fails: unknown tags are skipped with their text kept, unterminated
/// tags are read as text.
pub fn parse_html(input: &str) -> ParsedContent {
    if !input.contains('<') {
        return parse_plain(input);
    }

    let mut reader = MarkupReader::default();
    let mut rest = input;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<!--") {
            rest = match after.find("-->") {
                Some(end) => &after[end + 3..],
                None => "",
            };
            continue;
        }
        if rest.starts_with('<') {
            if let Some((tag, after)) = read_tag(rest) {
                reader.tag(tag);
                rest = after;
                continue;
            }
            // Not a tag: a literal '<' in text.
            reader.text("<");
            rest = &rest[1..];
            continue;
        }
        let end = rest.find('<').unwrap_or(rest.len());
        reader.text(&rest[..end]);
        rest = &rest[end..];
    }

    reader.finish()
}

fn parse_plain(input: &str) -> ParsedContent {
    let text = input.replace("\r\n", "\n");
    let len = text.chars().count();
    ParsedContent {
        styles: StyleRuns::plain(len),
        text,
    }
}

#[derive(Debug)]
struct Tag<'a> {
    name: SmolStr,
    closing: bool,
    attrs: Vec<(SmolStr, String)>,
    raw: &'a str,
}

impl Tag<'_> {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Read one tag at the start of `input`, returning it and the remaining input.
fn read_tag(input: &str) -> Option<(Tag<'_>, &str)> {
    let body_start = 1;
    let mut closing = false;
    let mut pos = body_start;
    let bytes = input.as_bytes();

    if bytes.get(pos) == Some(&b'/') {
        closing = true;
        pos += 1;
    }
    if !bytes.get(pos).is_some_and(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    // Find the closing '>' while respecting quoted attribute values.
    let mut quote: Option<u8> = None;
    let mut end = None;
    for (i, &b) in bytes.iter().enumerate().skip(pos) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => {
                end = Some(i);
                break;
            }
            _ => {}
        }
    }
    let end = end?;
    let body = input[pos..end].trim_end_matches('/');

    let name_end = body
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(body.len());
    let name = SmolStr::new(body[..name_end].to_ascii_lowercase());
    let attrs = if closing {
        Vec::new()
    } else {
        read_attrs(&body[name_end..])
    };

    Some((
        Tag {
            name,
            closing,
            attrs,
            raw: &input[..=end],
        },
        &input[end + 1..],
    ))
}

fn read_attrs(mut s: &str) -> Vec<(SmolStr, String)> {
    let mut attrs = Vec::new();
    loop {
        s = s.trim_start();
        if s.is_empty() {
            break;
        }
        let name_end = s
            .find(|c: char| c == '=' || c.is_ascii_whitespace())
            .unwrap_or(s.len());
        let name = SmolStr::new(s[..name_end].to_ascii_lowercase());
        s = s[name_end..].trim_start();

        let Some(after_eq) = s.strip_prefix('=') else {
            if !name.is_empty() {
                attrs.push((name, String::new()));
            }
            if name_end == 0 {
                // Stray character; skip it.
                s = &s[s.chars().next().map_or(0, char::len_utf8)..];
            }
            continue;
        };
        let after_eq = after_eq.trim_start();
        let (value, rest) = match after_eq.chars().next() {
            Some(q @ ('"' | '\'')) => {
                let inner = &after_eq[1..];
                match inner.find(q) {
                    Some(close) => (&inner[..close], &inner[close + 1..]),
                    None => (inner, ""),
                }
            }
            _ => {
                let end = after_eq
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            }
        };
        attrs.push((name, decode_entities(value)));
        s = rest;
    }
    attrs
}

const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "li",
    "blockquote",
    "pre",
];

const VOID_TAGS: &[&str] = &[
    "br", "img", "hr", "input", "meta", "link", "wbr", "col", "source",
];

#[derive(Default)]
struct Paragraph {
    text: String,
    runs: StyleRuns,
}

impl Paragraph {
    fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Default)]
struct MarkupReader {
    paragraphs: Vec<Paragraph>,
    current: Paragraph,
    /// A paragraph is in progress (content or an explicit block start seen).
    open: bool,
    /// The last thing read was a `<br>` that already ended a paragraph.
    after_br: bool,
    stack: Vec<(SmolStr, TextStyle)>,
}

impl MarkupReader {
    fn style(&self) -> TextStyle {
        self.stack
            .last()
            .map(|(_, style)| style.clone())
            .unwrap_or_default()
    }

    fn text(&mut self, raw: &str) {
        let collapsed = collapse_whitespace(raw, self.current.is_empty());
        if collapsed.is_empty() {
            return;
        }
        if !self.open && collapsed.trim_matches(' ').is_empty() {
            return;
        }
        let text = decode_entities(&collapsed);
        let len = text.chars().count();
        self.current.text.push_str(&text);
        self.current.runs.push(StyleRun::new(len, self.style()));
        self.open = true;
        self.after_br = false;
    }

    fn flush(&mut self) {
        let para = std::mem::take(&mut self.current);
        self.paragraphs.push(para);
        self.open = false;
        self.after_br = false;
    }

    fn tag(&mut self, tag: Tag<'_>) {
        let name = tag.name.as_str();
        let is_block = BLOCK_TAGS.contains(&name);

        if tag.closing {
            if is_block {
                if self.open && !(self.after_br && self.current.is_empty()) {
                    self.flush();
                }
                self.open = false;
                self.after_br = false;
            }
            if let Some(idx) = self.stack.iter().rposition(|(n, _)| n == name) {
                self.stack.truncate(idx);
            } else {
                tracing::trace!(target: "infinity::html", tag = tag.raw, "unmatched closing tag");
            }
            return;
        }

        if name == "br" {
            self.flush();
            self.open = true;
            self.after_br = true;
            return;
        }
        if VOID_TAGS.contains(&name) {
            return;
        }

        if is_block && self.open {
            self.flush();
        }

        let style = styled_by(&tag, self.style());
        self.stack.push((tag.name.clone(), style));
    }

    fn finish(mut self) -> ParsedContent {
        if self.open && !(self.after_br && self.current.is_empty()) {
            self.flush();
        }

        let mut text = String::new();
        let mut styles = StyleRuns::new();
        for (i, para) in self.paragraphs.into_iter().enumerate() {
            if i > 0 {
                text.push('\n');
                styles.push(StyleRun::plain(1));
            }
            text.push_str(&para.text);
            for run in para.runs.runs() {
                styles.push(run.clone());
            }
        }
        ParsedContent { text, styles }
    }
}

/// Style in effect inside `tag`, given the style outside it.
fn styled_by(tag: &Tag<'_>, mut style: TextStyle) -> TextStyle {
    match tag.name.as_str() {
        "b" | "strong" => style.bold = true,
        "i" | "em" => style.italic = true,
        "u" | "ins" => style.underline = true,
        "s" | "strike" | "del" => style.strikethrough = true,
        "font" => {
            if let Some(face) = tag.attr("face") {
                style.font_family = Some(face.into());
            }
            if let Some(size) = tag.attr("size").and_then(legacy_font_size) {
                style.font_size = Some(size.into());
            }
            if let Some(color) = tag.attr("color") {
                style.color = Some(color.into());
            }
        }
        _ => {}
    }
    if let Some(css) = tag.attr("style") {
        apply_inline_css(&mut style, css);
    }
    style
}

fn apply_inline_css(style: &mut TextStyle, css: &str) {
    for decl in css.split(';') {
        let Some((prop, value)) = decl.split_once(':') else {
            continue;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match prop.as_str() {
            "font-family" => style.font_family = Some(value.into()),
            "font-size" => style.font_size = Some(value.into()),
            "color" => style.color = Some(value.into()),
            "background-color" | "background" => style.background = Some(value.into()),
            "font-weight" => {
                style.bold = value == "bold"
                    || value == "bolder"
                    || value.parse::<u32>().is_ok_and(|w| w >= 600);
            }
            "font-style" => style.italic = value == "italic" || value == "oblique",
            "text-decoration" | "text-decoration-line" => {
                style.underline = value.contains("underline");
                style.strikethrough = value.contains("line-through");
            }
            _ => {}
        }
    }
}

/// Collapse ASCII whitespace runs to one space, as rendered markup does.
fn collapse_whitespace(raw: &str, trim_start: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_space = trim_start;
    for c in raw.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Decode the entities the writer and common browsers produce.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &rest[1..semi];
            decode_entity(entity).map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        // Surfaces write typed spaces as `&nbsp;` to keep them from
        // collapsing; `&#160;` stays a no-break space.
        "nbsp" => Some(' '),
        _ => {
            let num = entity.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
