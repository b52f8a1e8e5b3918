//! Single-line refresh with minimal redraw.
//!
//! The renderer remembers what it last put on the row after the prompt and
//! where it left the terminal cursor. A refresh rewrites only the suffix that
//! differs from the previous frame, clears leftovers when the line got
//! shorter, then parks the cursor. Appending at the end of a line that fits
//! therefore costs exactly the echoed character.

use crossterm::cursor::{MoveTo, MoveToColumn};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use std::io::{self, Write};
use unicode_width::UnicodeWidthChar;

/// Columns occupied by one character.
pub(crate) fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Columns occupied by a run of characters.
pub(crate) fn chars_width(chars: &[char]) -> usize {
    chars.iter().map(|ch| char_width(*ch)).sum()
}

/// Visible width of a prompt, skipping `ESC [ ... final` color sequences.
pub fn display_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for next in chars.by_ref() {
                if ('\x40'..='\x7e').contains(&next) {
                    break;
                }
            }
            continue;
        }
        width += char_width(ch);
    }
    width
}

/// Slice of the buffer that fits on screen, plus where the cursor goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    /// Index of the first buffer character shown.
    pub(crate) offset: usize,
    pub(crate) visible: Vec<char>,
    /// Absolute terminal column for the cursor.
    pub(crate) cursor_col: usize,
}

/// Lay out `buf` after a prompt of `prompt_width` columns on a `cols`-wide
/// row, scrolling horizontally so the cursor always stays on screen.
pub(crate) fn layout(buf: &[char], pos: usize, prompt_width: usize, cols: usize) -> Frame {
    let avail = cols.saturating_sub(prompt_width).max(1);

    // The cursor needs a free cell of its own, hence `avail - 1`.
    let mut offset = 0;
    let mut before_cursor = chars_width(&buf[..pos]);
    while before_cursor > avail - 1 && offset < pos {
        before_cursor -= char_width(buf[offset]);
        offset += 1;
    }

    let mut visible = Vec::new();
    let mut used = 0;
    for ch in &buf[offset..] {
        let w = char_width(*ch);
        if used + w > avail {
            break;
        }
        used += w;
        visible.push(*ch);
    }

    Frame {
        offset,
        visible,
        cursor_col: prompt_width + before_cursor,
    }
}

/// What the terminal row currently shows after the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Screen {
    pub(crate) visible: Vec<char>,
    /// Absolute column the terminal cursor was left at.
    pub(crate) term_col: usize,
}

impl Screen {
    /// Screen right after the prompt has been written.
    pub(crate) fn after_prompt(prompt_width: usize) -> Self {
        Self {
            visible: Vec::new(),
            term_col: prompt_width,
        }
    }
}

/// Bring the row from `screen` to `frame`, touching only what changed.
pub(crate) fn refresh<W: Write>(
    out: &mut W,
    screen: &mut Screen,
    frame: &Frame,
    prompt_width: usize,
) -> io::Result<()> {
    let common = screen
        .visible
        .iter()
        .zip(&frame.visible)
        .take_while(|(old, new)| old == new)
        .count();

    if common < screen.visible.len() || common < frame.visible.len() {
        let start_col = prompt_width + chars_width(&frame.visible[..common]);
        move_cursor(out, screen.term_col, start_col)?;
        let suffix: String = frame.visible[common..].iter().collect();
        out.queue(Print(suffix))?;
        let new_width = chars_width(&frame.visible);
        if new_width < chars_width(&screen.visible) {
            out.queue(Clear(ClearType::UntilNewLine))?;
        }
        screen.term_col = prompt_width + new_width;
        screen.visible.clone_from(&frame.visible);
    }

    move_cursor(out, screen.term_col, frame.cursor_col)?;
    screen.term_col = frame.cursor_col;
    out.flush()
}

/// Rewrite the whole row: prompt, visible text, cursor.
pub(crate) fn redraw<W: Write>(
    out: &mut W,
    screen: &mut Screen,
    frame: &Frame,
    prompt: &str,
    prompt_width: usize,
) -> io::Result<()> {
    out.queue(Print("\r"))?;
    out.queue(Print(prompt))?;
    let text: String = frame.visible.iter().collect();
    out.queue(Print(text))?;
    out.queue(Clear(ClearType::UntilNewLine))?;
    screen.visible.clone_from(&frame.visible);
    screen.term_col = prompt_width + chars_width(&frame.visible);
    move_cursor(out, screen.term_col, frame.cursor_col)?;
    screen.term_col = frame.cursor_col;
    out.flush()
}

/// Home the cursor and clear the whole screen.
pub(crate) fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    out.queue(MoveTo(0, 0))?;
    out.queue(Clear(ClearType::All))?;
    out.flush()
}

fn move_cursor<W: Write>(out: &mut W, from: usize, to: usize) -> io::Result<()> {
    if from != to {
        out.queue(MoveToColumn(u16::try_from(to).unwrap_or(u16::MAX)))?;
    }
    Ok(())
}
