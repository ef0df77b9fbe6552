//! Inline styles and the run-length style table.
//!
//! Styles live next to the text rather than inside it: a `StyleRuns` table
//! holds `(len, style)` runs whose lengths sum to the document's char count.
//! Every text mutation has a matching run mutation so the two never drift.

use std::ops::Range;

use smol_str::SmolStr;

/// Inline formatting carried by a span of text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub font_family: Option<SmolStr>,
    pub font_size: Option<SmolStr>,
    pub color: Option<SmolStr>,
    pub background: Option<SmolStr>,
}

impl TextStyle {
    /// True when no formatting is set.
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// True when any of the CSS-valued properties is set.
    pub fn has_inline_css(&self) -> bool {
        self.font_family.is_some()
            || self.font_size.is_some()
            || self.color.is_some()
            || self.background.is_some()
    }
}

/// A toggleable style flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StyleFlag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl StyleFlag {
    pub fn get(self, style: &TextStyle) -> bool {
        match self {
            Self::Bold => style.bold,
            Self::Italic => style.italic,
            Self::Underline => style.underline,
            Self::Strikethrough => style.strikethrough,
        }
    }

    pub fn set(self, style: &mut TextStyle, on: bool) {
        match self {
            Self::Bold => style.bold = on,
            Self::Italic => style.italic = on,
            Self::Underline => style.underline = on,
            Self::Strikethrough => style.strikethrough = on,
        }
    }
}

/// A run of `len` chars sharing one style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleRun {
    pub len: usize,
    pub style: TextStyle,
}

impl StyleRun {
    pub fn new(len: usize, style: TextStyle) -> Self {
        Self { len, style }
    }

    pub fn plain(len: usize) -> Self {
        Self {
            len,
            style: TextStyle::default(),
        }
    }
}

/// Run-length style table aligned with a text buffer.
///
/// Invariant: no zero-length runs, no two adjacent runs with equal styles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StyleRuns {
    runs: Vec<StyleRun>,
}

impl StyleRuns {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table of `len` unstyled chars.
    pub fn plain(len: usize) -> Self {
        let mut runs = Self::new();
        runs.push(StyleRun::plain(len));
        runs
    }

    pub fn from_runs(runs: impl IntoIterator<Item = StyleRun>) -> Self {
        let mut table = Self::new();
        for run in runs {
            table.push(run);
        }
        table
    }

    /// Total length covered, in chars.
    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| r.len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    /// Append a run, merging with the last one when styles match.
    pub fn push(&mut self, run: StyleRun) {
        if run.len == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.style == run.style => last.len += run.len,
            _ => self.runs.push(run),
        }
    }

    /// Style of the char at `offset`, if in bounds.
    pub fn style_at(&self, offset: usize) -> Option<&TextStyle> {
        let mut start = 0;
        for run in &self.runs {
            if offset < start + run.len {
                return Some(&run.style);
            }
            start += run.len;
        }
        None
    }

    /// Runs covering `range`, cut at the range edges.
    pub fn slice(&self, range: Range<usize>) -> Vec<StyleRun> {
        let mut out = Vec::new();
        let mut start = 0;
        for run in &self.runs {
            let end = start + run.len;
            let lo = range.start.max(start);
            let hi = range.end.min(end);
            if lo < hi {
                out.push(StyleRun::new(hi - lo, run.style.clone()));
            }
            if end >= range.end {
                break;
            }
            start = end;
        }
        out
    }

    /// Replace the runs covering `range` with `replacement`.
    ///
    /// `replacement` may have a different total length than `range`; this is
    /// how inserts (empty range) and deletes (empty replacement) are expressed.
    pub fn splice(&mut self, range: Range<usize>, replacement: &[StyleRun]) {
        let total = self.len();
        let before = self.slice(0..range.start.min(total));
        let after = self.slice(range.end.min(total)..total);
        let mut rebuilt = StyleRuns::new();
        for run in before
            .into_iter()
            .chain(replacement.iter().cloned())
            .chain(after)
        {
            rebuilt.push(run);
        }
        *self = rebuilt;
    }

    /// Insert `len` chars of `style` at `offset`.
    pub fn insert(&mut self, offset: usize, len: usize, style: TextStyle) {
        self.splice(offset..offset, &[StyleRun::new(len, style)]);
    }

    /// Remove the runs covering `range`.
    pub fn remove(&mut self, range: Range<usize>) {
        self.splice(range, &[]);
    }

    /// Rewrite the style of every char in `range` with `f`.
    pub fn apply(&mut self, range: Range<usize>, mut f: impl FnMut(&mut TextStyle)) {
        let restyled: Vec<StyleRun> = self
            .slice(range.clone())
            .into_iter()
            .map(|mut run| {
                f(&mut run.style);
                run
            })
            .collect();
        self.splice(range, &restyled);
    }
}
