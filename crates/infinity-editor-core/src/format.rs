//! Formatting commands and their reducer.
//!
//! Formatting is a tagged [`FormatCommand`] applied to the document model by
//! [`execute_format`]. [`dispatch_format`] wraps the reducer in the
//! surface round trip: restore the saved selection, apply, render, re-save.

use std::ops::Range;

use smol_str::SmolStr;

use crate::document::EditorDocument;
use crate::error::FormatError;
use crate::html::legacy_font_size;
use crate::platform::EditorSurface;
use crate::selection::SelectionTracker;
use crate::style::{StyleFlag, TextStyle};
use crate::types::Selection;

/// Chars that would let a value escape its CSS declaration or attribute.
const FORBIDDEN_VALUE_CHARS: &[char] = &[';', '"', '<', '>', '{', '}'];

/// Units accepted for precise font sizes. `rem` must come before `em`.
const FONT_SIZE_UNITS: &[&str] = &["px", "rem", "em", "pt", "%"];

/// A formatting or history command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    FontName(SmolStr),
    /// A CSS length, already normalized from legacy steps.
    FontSize(SmolStr),
    ForeColor(SmolStr),
    BackColor(SmolStr),
    RemoveFormat,
    Undo,
    Redo,
    SelectAll,
}

impl FormatCommand {
    /// Parse a legacy action name and optional value.
    ///
    /// Names match case-insensitively. Valued commands validate their value
    /// here so a bad one never reaches the document.
    pub fn parse(action: &str, value: Option<&str>) -> Result<Self, FormatError> {
        let cmd = match action.to_ascii_lowercase().as_str() {
            "bold" => Self::Bold,
            "italic" => Self::Italic,
            "underline" => Self::Underline,
            "strikethrough" => Self::Strikethrough,
            "removeformat" => Self::RemoveFormat,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            "selectall" => Self::SelectAll,
            "fontname" => Self::FontName(css_value("fontName", value)?),
            "fontsize" => Self::FontSize(font_size_value(value)?),
            "forecolor" => Self::ForeColor(css_value("foreColor", value)?),
            "hilitecolor" | "backcolor" => Self::BackColor(css_value("backColor", value)?),
            _ => return Err(FormatError::UnknownAction(action.to_string())),
        };
        Ok(cmd)
    }

    /// Canonical action name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Underline => "underline",
            Self::Strikethrough => "strikeThrough",
            Self::FontName(_) => "fontName",
            Self::FontSize(_) => "fontSize",
            Self::ForeColor(_) => "foreColor",
            Self::BackColor(_) => "backColor",
            Self::RemoveFormat => "removeFormat",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::SelectAll => "selectAll",
        }
    }

    /// Whether the command needs a ranged selection.
    pub fn needs_selection(&self) -> bool {
        !matches!(self, Self::Undo | Self::Redo | Self::SelectAll)
    }

    fn flag(&self) -> Option<StyleFlag> {
        match self {
            Self::Bold => Some(StyleFlag::Bold),
            Self::Italic => Some(StyleFlag::Italic),
            Self::Underline => Some(StyleFlag::Underline),
            Self::Strikethrough => Some(StyleFlag::Strikethrough),
            _ => None,
        }
    }
}

fn css_value(action: &'static str, value: Option<&str>) -> Result<SmolStr, FormatError> {
    let value = value.ok_or(FormatError::MissingValue { action })?.trim();
    if value.is_empty() || value.contains(FORBIDDEN_VALUE_CHARS) {
        return Err(FormatError::InvalidValue {
            action,
            value: value.to_string(),
        });
    }
    Ok(SmolStr::new(value))
}

fn font_size_value(value: Option<&str>) -> Result<SmolStr, FormatError> {
    let value = css_value("fontSize", value)?;
    if let Some(css) = legacy_font_size(&value) {
        return Ok(SmolStr::new_static(css));
    }
    let is_length = FONT_SIZE_UNITS.iter().any(|unit| {
        value
            .strip_suffix(unit)
            .and_then(|n| n.parse::<f64>().ok())
            .is_some_and(|n| n.is_finite() && n > 0.0)
    });
    if is_length {
        Ok(value)
    } else {
        Err(FormatError::InvalidValue {
            action: "fontSize",
            value: value.to_string(),
        })
    }
}

/// Apply a command to the document.
///
/// `selection` is the range to format; it becomes the document's selection.
/// Returns whether text or styles changed.
pub fn execute_format<D: EditorDocument>(
    doc: &mut D,
    cmd: &FormatCommand,
    selection: Option<Selection>,
) -> Result<bool, FormatError> {
    let len = doc.len_chars();
    match cmd {
        FormatCommand::Undo => return Ok(doc.undo()),
        FormatCommand::Redo => return Ok(doc.redo()),
        FormatCommand::SelectAll => {
            doc.set_selection(Some(Selection::new(0, len)));
            doc.set_cursor_offset(len);
            return Ok(false);
        }
        _ => {}
    }

    let selection = selection.ok_or(FormatError::NoSelection)?;
    if selection.is_collapsed() {
        return Err(FormatError::CollapsedSelection);
    }
    if selection.end() > len {
        return Err(FormatError::OutOfBounds {
            start: selection.start(),
            end: selection.end(),
            len,
        });
    }
    doc.set_selection(Some(selection));
    let range = selection.to_range();

    let changed = match cmd {
        FormatCommand::Bold
        | FormatCommand::Italic
        | FormatCommand::Underline
        | FormatCommand::Strikethrough => {
            let Some(flag) = cmd.flag() else {
                return Ok(false);
            };
            let on = !flag_covers(doc, range.clone(), flag);
            apply_style(doc, range, |s| flag.set(s, on))
        }
        FormatCommand::FontName(v) => apply_style(doc, range, |s| s.font_family = Some(v.clone())),
        FormatCommand::FontSize(v) => apply_style(doc, range, |s| s.font_size = Some(v.clone())),
        FormatCommand::ForeColor(v) => apply_style(doc, range, |s| s.color = Some(v.clone())),
        FormatCommand::BackColor(v) => apply_style(doc, range, |s| s.background = Some(v.clone())),
        FormatCommand::RemoveFormat => apply_style(doc, range, |s| *s = TextStyle::default()),
        FormatCommand::Undo | FormatCommand::Redo | FormatCommand::SelectAll => false,
    };
    Ok(changed)
}

/// Whether every non-newline char in `range` already has `flag`.
fn flag_covers<D: EditorDocument>(doc: &D, range: Range<usize>, flag: StyleFlag) -> bool {
    let mut offset = range.start;
    for run in doc.style_runs(range) {
        let has_text = (offset..offset + run.len).any(|i| doc.char_at(i) != Some('\n'));
        if has_text && !flag.get(&run.style) {
            return false;
        }
        offset += run.len;
    }
    true
}

fn apply_style<D: EditorDocument>(
    doc: &mut D,
    range: Range<usize>,
    f: impl FnMut(&mut TextStyle),
) -> bool {
    let before = doc.style_runs(range.clone());
    doc.restyle(range.clone(), f);
    doc.style_runs(range) != before
}

/// Run a command through the full surface round trip.
///
/// 1. restore the saved selection onto the surface,
/// 2. apply the command to the model,
/// 3. render the model back into the surface,
/// 4. re-save the selection the model ended up with.
///
/// Render and selection-write failures are logged and absorbed; only the
/// command's own failure is returned.
pub fn dispatch_format<D, S>(
    doc: &mut D,
    tracker: &mut SelectionTracker,
    surface: &mut S,
    cmd: &FormatCommand,
) -> Result<bool, FormatError>
where
    D: EditorDocument,
    S: EditorSurface + ?Sized,
{
    let selection = tracker.restore_selection(surface);
    let changed = execute_format(doc, cmd, selection)?;

    if changed {
        if let Err(e) = surface.render(&doc.content_html()) {
            tracing::warn!(target: "infinity::format", action = cmd.name(), error = %e, "render failed");
        }
    }

    tracker.store(doc.selection());
    tracker.restore_selection(surface);
    tracing::debug!(target: "infinity::format", action = cmd.name(), changed, "format applied");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RichDocument;
    use crate::surface::MemorySurface;

    fn make_editor(content: &str) -> RichDocument {
        RichDocument::from_html(content, 100)
    }

    fn format(doc: &mut RichDocument, cmd: FormatCommand, start: usize, end: usize) -> bool {
        execute_format(doc, &cmd, Some(Selection::new(start, end))).expect("format")
    }

    #[test]
    fn test_parse_action_names() {
        assert_eq!(FormatCommand::parse("bold", None), Ok(FormatCommand::Bold));
        assert_eq!(
            FormatCommand::parse("strikeThrough", None),
            Ok(FormatCommand::Strikethrough)
        );
        assert_eq!(
            FormatCommand::parse("hiliteColor", Some("#ff0")),
            Ok(FormatCommand::BackColor("#ff0".into()))
        );
        assert_eq!(
            FormatCommand::parse("insertImage", None),
            Err(FormatError::UnknownAction("insertImage".into()))
        );
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert_eq!(
            FormatCommand::parse("foreColor", None),
            Err(FormatError::MissingValue {
                action: "foreColor"
            })
        );
        assert!(matches!(
            FormatCommand::parse("foreColor", Some("red; display: none")),
            Err(FormatError::InvalidValue { .. })
        ));
        assert!(matches!(
            FormatCommand::parse("fontName", Some("  ")),
            Err(FormatError::InvalidValue { .. })
        ));
        assert!(matches!(
            FormatCommand::parse("fontSize", Some("huge")),
            Err(FormatError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_font_size_values() {
        assert_eq!(
            FormatCommand::parse("fontSize", Some("3")),
            Ok(FormatCommand::FontSize("16px".into()))
        );
        assert_eq!(
            FormatCommand::parse("fontSize", Some("1.25rem")),
            Ok(FormatCommand::FontSize("1.25rem".into()))
        );
        assert_eq!(
            FormatCommand::parse("fontSize", Some("14px")),
            Ok(FormatCommand::FontSize("14px".into()))
        );
    }

    #[test]
    fn test_bold_toggles() {
        let mut doc = make_editor("<p>hello</p>");
        assert!(format(&mut doc, FormatCommand::Bold, 0, 5));
        insta::assert_snapshot!(doc.content_html(), @"<p><b>hello</b></p>");

        assert!(format(&mut doc, FormatCommand::Bold, 0, 5));
        assert_eq!(doc.content_html(), "<p>hello</p>");
    }

    #[test]
    fn test_partial_bold_sets_whole_range() {
        let mut doc = make_editor("<p><b>he</b>llo</p>");
        assert!(format(&mut doc, FormatCommand::Bold, 0, 5));
        assert_eq!(doc.content_html(), "<p><b>hello</b></p>");
    }

    #[test]
    fn test_toggle_ignores_newlines() {
        let mut doc = make_editor("<p><i>one</i></p><p><i>two</i></p>");
        assert!(format(&mut doc, FormatCommand::Italic, 0, 7));
        assert_eq!(doc.content_html(), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_value_commands() {
        let mut doc = make_editor("<p>call client</p>");
        format(&mut doc, FormatCommand::ForeColor("#e11d48".into()), 5, 11);
        format(&mut doc, FormatCommand::FontSize("18px".into()), 5, 11);
        insta::assert_snapshot!(
            doc.content_html(),
            @r#"<p>call <span style="font-size: 18px; color: #e11d48">client</span></p>"#
        );

        assert!(format(&mut doc, FormatCommand::RemoveFormat, 0, 11));
        assert_eq!(doc.content_html(), "<p>call client</p>");
    }

    #[test]
    fn test_noop_format_reports_unchanged() {
        let mut doc = make_editor("<p>plain</p>");
        assert!(!format(&mut doc, FormatCommand::RemoveFormat, 0, 5));
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_selection_errors() {
        let mut doc = make_editor("<p>hello</p>");
        assert_eq!(
            execute_format(&mut doc, &FormatCommand::Bold, None),
            Err(FormatError::NoSelection)
        );
        assert_eq!(
            execute_format(&mut doc, &FormatCommand::Bold, Some(Selection::collapsed(2))),
            Err(FormatError::CollapsedSelection)
        );
        assert_eq!(
            execute_format(&mut doc, &FormatCommand::Bold, Some(Selection::new(0, 9))),
            Err(FormatError::OutOfBounds {
                start: 0,
                end: 9,
                len: 5
            })
        );
        assert_eq!(doc.content_html(), "<p>hello</p>");
    }

    #[test]
    fn test_undo_redo_styles() {
        let mut doc = make_editor("<p>hello</p>");
        format(&mut doc, FormatCommand::Underline, 0, 5);

        assert_eq!(execute_format(&mut doc, &FormatCommand::Undo, None), Ok(true));
        assert_eq!(doc.content_html(), "<p>hello</p>");
        assert_eq!(execute_format(&mut doc, &FormatCommand::Redo, None), Ok(true));
        assert_eq!(doc.content_html(), "<p><u>hello</u></p>");
        assert_eq!(execute_format(&mut doc, &FormatCommand::Redo, None), Ok(false));
    }

    #[test]
    fn test_select_all() {
        let mut doc = make_editor("<p>hello</p>");
        assert_eq!(
            execute_format(&mut doc, &FormatCommand::SelectAll, None),
            Ok(false)
        );
        assert_eq!(doc.selection(), Some(Selection::new(0, 5)));
    }

    #[test]
    fn test_dispatch_uses_saved_selection() {
        let mut doc = make_editor("<p>hello world</p>");
        let mut surface = MemorySurface::new();
        surface.render(&doc.content_html()).expect("render");
        let mut tracker = SelectionTracker::new();

        surface.select(6, 11);
        tracker.save_current_selection(&surface);
        // Focus moves to the toolbar.
        surface.select_outside();

        let changed = dispatch_format(&mut doc, &mut tracker, &mut surface, &FormatCommand::Bold);
        assert_eq!(changed, Ok(true));
        assert_eq!(surface.markup(), "<p>hello <b>world</b></p>");
        assert_eq!(surface.live_selection(), Some(Selection::new(6, 11)));
        assert_eq!(tracker.saved(), Some(Selection::new(6, 11)));
    }

    #[test]
    fn test_dispatch_absorbs_render_failure() {
        let mut doc = make_editor("<p>hello</p>");
        let mut surface = MemorySurface::new();
        let mut tracker = SelectionTracker::new();
        surface.select(0, 5);
        tracker.save_current_selection(&surface);
        surface.fail_render(true);

        let changed = dispatch_format(&mut doc, &mut tracker, &mut surface, &FormatCommand::Italic);
        assert_eq!(changed, Ok(true));
        assert_eq!(doc.content_html(), "<p><i>hello</i></p>");
    }
}
