//! The line-edit state machine.
//!
//! [`LineState`] owns the buffer for one edit call and consumes input one
//! byte at a time. Every mutation is followed by an incremental refresh, so
//! the terminal row always converges to the logical buffer.

use crate::editor::keys::{Key, KeyDecoder};
use crate::editor::render::{self, Frame, Screen};
use crate::history::HistoryRing;
use std::io::{self, Write};

/// Where an edit stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Editing,
    /// Enter was pressed; holds the finished line.
    Done(String),
    /// The interrupt key (`Ctrl-C`) was pressed.
    Cancelled,
    /// Input ended (`Ctrl-D` on an empty buffer, or the stream closed).
    Eof,
}

impl EditState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::Editing)
    }
}

/// Buffer, cursor and rendering state for one interactive edit.
#[derive(Debug)]
pub struct LineState {
    buf: Vec<char>,
    /// Cursor as a char index, always within `0..=buf.len()`.
    pos: usize,
    prompt: String,
    prompt_width: usize,
    cols: usize,
    /// Most terminal rows this edit has occupied. Single-line rendering
    /// never grows it past one.
    max_rows: usize,
    /// `0` is the in-progress line; `n` is the n-th newest history entry.
    history_index: usize,
    /// In-progress line saved while browsing history.
    draft: String,
    decoder: KeyDecoder,
    screen: Screen,
    state: EditState,
}

impl LineState {
    pub fn new(prompt: &str, cols: usize) -> Self {
        let prompt_width = render::display_width(prompt);
        Self {
            buf: Vec::new(),
            pos: 0,
            prompt: prompt.to_string(),
            prompt_width,
            cols: cols.max(1),
            max_rows: 0,
            history_index: 0,
            draft: String::new(),
            decoder: KeyDecoder::new(),
            screen: Screen::after_prompt(prompt_width),
            state: EditState::Editing,
        }
    }

    /// Current buffer contents.
    pub fn line(&self) -> String {
        self.buf.iter().collect()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Terminal column the last refresh left the cursor at.
    pub fn rendered_col(&self) -> usize {
        self.screen.term_col
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn history_index(&self) -> usize {
        self.history_index
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Write the prompt. Call once before feeding bytes.
    pub fn start<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        out.write_all(self.prompt.as_bytes())?;
        out.flush()?;
        self.screen = Screen::after_prompt(self.prompt_width);
        self.max_rows = 1;
        Ok(())
    }

    /// Feed one input byte. Bytes arriving after the edit finished are ignored.
    pub fn feed<W: Write>(
        &mut self,
        byte: u8,
        history: &HistoryRing,
        out: &mut W,
    ) -> io::Result<&EditState> {
        if self.state.is_finished() {
            return Ok(&self.state);
        }
        if let Some(key) = self.decoder.feed(byte) {
            self.apply(key, history, out)?;
        }
        Ok(&self.state)
    }

    /// The input stream closed: finish with whatever has been typed, or
    /// [`EditState::Eof`] when nothing has.
    pub fn end_of_input<W: Write>(&mut self, out: &mut W) -> io::Result<&EditState> {
        if !self.state.is_finished() {
            let state = if self.buf.is_empty() {
                EditState::Eof
            } else {
                EditState::Done(self.line())
            };
            self.finish(state, out)?;
        }
        Ok(&self.state)
    }

    fn apply<W: Write>(&mut self, key: Key, history: &HistoryRing, out: &mut W) -> io::Result<()> {
        match key {
            Key::Enter => {
                let line = self.line();
                self.finish(EditState::Done(line), out)?;
            }
            Key::Ctrl('c') => {
                self.finish(EditState::Cancelled, out)?;
            }
            Key::Ctrl('d') => {
                // Ctrl-D exits only when no text is present.
                if self.buf.is_empty() {
                    self.finish(EditState::Eof, out)?;
                } else if self.pos < self.buf.len() {
                    self.buf.remove(self.pos);
                    self.refresh(out)?;
                }
            }
            Key::Char(ch) => {
                self.buf.insert(self.pos, ch);
                self.pos += 1;
                self.refresh(out)?;
            }
            Key::Backspace => {
                if self.pos > 0 {
                    self.pos -= 1;
                    self.buf.remove(self.pos);
                    self.refresh(out)?;
                }
            }
            Key::Delete => {
                if self.pos < self.buf.len() {
                    self.buf.remove(self.pos);
                    self.refresh(out)?;
                }
            }
            Key::Left | Key::Ctrl('b') => {
                if self.pos > 0 {
                    self.pos -= 1;
                    self.refresh(out)?;
                }
            }
            Key::Right | Key::Ctrl('f') => {
                if self.pos < self.buf.len() {
                    self.pos += 1;
                    self.refresh(out)?;
                }
            }
            Key::Home | Key::Ctrl('a') => {
                self.pos = 0;
                self.refresh(out)?;
            }
            Key::End | Key::Ctrl('e') => {
                self.pos = self.buf.len();
                self.refresh(out)?;
            }
            Key::Up | Key::Ctrl('p') => {
                if self.history_prev(history) {
                    self.refresh(out)?;
                }
            }
            Key::Down | Key::Ctrl('n') => {
                if self.history_next(history) {
                    self.refresh(out)?;
                }
            }
            Key::Ctrl('k') => {
                // Kill to end of line.
                self.buf.truncate(self.pos);
                self.refresh(out)?;
            }
            Key::Ctrl('u') => {
                // Kill the whole line.
                self.buf.clear();
                self.pos = 0;
                self.refresh(out)?;
            }
            Key::Ctrl('w') => {
                let start = previous_word_start(&self.buf, self.pos);
                self.buf.drain(start..self.pos);
                self.pos = start;
                self.refresh(out)?;
            }
            Key::Ctrl('t') => {
                if self.pos > 0 && self.pos < self.buf.len() {
                    self.buf.swap(self.pos - 1, self.pos);
                    if self.pos != self.buf.len() - 1 {
                        self.pos += 1;
                    }
                    self.refresh(out)?;
                }
            }
            Key::Ctrl('l') => {
                render::clear_screen(out)?;
                let frame = self.frame();
                render::redraw(out, &mut self.screen, &frame, &self.prompt, self.prompt_width)?;
            }
            // Tab and the remaining control chords are recognized but inert.
            Key::Tab | Key::Ctrl(_) => {}
        }
        Ok(())
    }

    /// Step towards older entries. Returns whether the buffer changed.
    fn history_prev(&mut self, history: &HistoryRing) -> bool {
        if self.history_index >= history.len() {
            return false;
        }
        if self.history_index == 0 {
            self.draft = self.line();
        }
        self.history_index += 1;
        self.load_history_slot(history);
        true
    }

    /// Step towards newer entries, ending at the saved in-progress line.
    fn history_next(&mut self, history: &HistoryRing) -> bool {
        if self.history_index == 0 {
            return false;
        }
        self.history_index -= 1;
        self.load_history_slot(history);
        true
    }

    fn load_history_slot(&mut self, history: &HistoryRing) {
        let text = if self.history_index == 0 {
            self.draft.as_str()
        } else {
            history
                .get_from_newest(self.history_index - 1)
                .unwrap_or_default()
        };
        self.buf = text.chars().collect();
        self.pos = self.buf.len();
    }

    fn frame(&self) -> Frame {
        render::layout(&self.buf, self.pos, self.prompt_width, self.cols)
    }

    fn refresh<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let frame = self.frame();
        render::refresh(out, &mut self.screen, &frame, self.prompt_width)?;
        self.max_rows = self.max_rows.max(1);
        Ok(())
    }

    /// Park the cursor after the text so the caller's newline does not cut
    /// the line short, then enter the final state.
    fn finish<W: Write>(&mut self, state: EditState, out: &mut W) -> io::Result<()> {
        if self.pos != self.buf.len() {
            self.pos = self.buf.len();
            self.refresh(out)?;
        }
        self.state = state;
        Ok(())
    }
}

/// Char index where the word before `pos` starts, skipping spaces first.
fn previous_word_start(buf: &[char], pos: usize) -> usize {
    let mut idx = pos;
    while idx > 0 && buf[idx - 1] == ' ' {
        idx -= 1;
    }
    while idx > 0 && buf[idx - 1] != ' ' {
        idx -= 1;
    }
    idx
}
