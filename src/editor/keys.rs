//! Byte-at-a-time key decoding.
//!
//! Raw mode delivers keys as single bytes, control codes, UTF-8 sequences and
//! `ESC [` / `ESC O` sequences. The decoder keeps just enough state to turn
//! that stream back into keys without ever blocking for more input.

/// Longest parameter run accepted inside a CSI sequence before giving up.
const MAX_CSI_LEN: usize = 16;

/// One decoded keypress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Printable character.
    Char(char),
    /// Control chord, stored as the lowercase letter (`Ctrl('c')` is 0x03).
    Ctrl(char),
    Enter,
    Tab,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum DecodeState {
    #[default]
    Ground,
    Escape,
    Csi(Vec<u8>),
    /// Over-long CSI: swallow until its final byte.
    CsiIgnore,
    Ss3,
    Utf8 {
        bytes: Vec<u8>,
        needed: usize,
    },
}

/// Incremental decoder from raw terminal bytes to [`Key`]s.
#[derive(Debug, Clone, Default)]
pub struct KeyDecoder {
    state: DecodeState,
}

impl KeyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the decoder is in the middle of a multi-byte sequence.
    pub fn is_pending(&self) -> bool {
        self.state != DecodeState::Ground
    }

    /// Consume one byte. Returns a key once a full one has been seen;
    /// unrecognized bytes and sequences yield nothing.
    pub fn feed(&mut self, byte: u8) -> Option<Key> {
        match std::mem::take(&mut self.state) {
            DecodeState::Ground => self.ground(byte),
            DecodeState::Escape => {
                match byte {
                    b'[' => self.state = DecodeState::Csi(Vec::new()),
                    b'O' => self.state = DecodeState::Ss3,
                    // A second ESC starts a fresh sequence.
                    0x1b => self.state = DecodeState::Escape,
                    _ => {}
                }
                None
            }
            DecodeState::Csi(mut params) => match byte {
                0x20..=0x3f if params.len() < MAX_CSI_LEN => {
                    params.push(byte);
                    self.state = DecodeState::Csi(params);
                    None
                }
                0x20..=0x3f => {
                    self.state = DecodeState::CsiIgnore;
                    None
                }
                0x40..=0x7e => csi_key(&params, byte),
                _ => None,
            },
            DecodeState::CsiIgnore => {
                if (0x20..=0x3f).contains(&byte) {
                    self.state = DecodeState::CsiIgnore;
                }
                None
            }
            DecodeState::Ss3 => match byte {
                b'A' => Some(Key::Up),
                b'B' => Some(Key::Down),
                b'C' => Some(Key::Right),
                b'D' => Some(Key::Left),
                b'H' => Some(Key::Home),
                b'F' => Some(Key::End),
                _ => None,
            },
            DecodeState::Utf8 { mut bytes, needed } => {
                if byte & 0xc0 != 0x80 {
                    // Broken sequence: drop it and treat this byte afresh.
                    return self.ground(byte);
                }
                bytes.push(byte);
                if bytes.len() < needed {
                    self.state = DecodeState::Utf8 { bytes, needed };
                    return None;
                }
                std::str::from_utf8(&bytes)
                    .ok()
                    .and_then(|s| s.chars().next())
                    .filter(|ch| !ch.is_control())
                    .map(Key::Char)
            }
        }
    }

    fn ground(&mut self, byte: u8) -> Option<Key> {
        match byte {
            b'\r' | b'\n' => Some(Key::Enter),
            b'\t' => Some(Key::Tab),
            0x08 | 0x7f => Some(Key::Backspace),
            0x1b => {
                self.state = DecodeState::Escape;
                None
            }
            0x01..=0x1a => Some(Key::Ctrl(char::from(byte - 1 + b'a'))),
            0x20..=0x7e => Some(Key::Char(char::from(byte))),
            0xc2..=0xf4 => {
                let needed = match byte {
                    0xc2..=0xdf => 2,
                    0xe0..=0xef => 3,
                    _ => 4,
                };
                self.state = DecodeState::Utf8 {
                    bytes: vec![byte],
                    needed,
                };
                None
            }
            _ => None,
        }
    }
}

fn csi_key(params: &[u8], final_byte: u8) -> Option<Key> {
    match (params, final_byte) {
        ([], b'A') => Some(Key::Up),
        ([], b'B') => Some(Key::Down),
        ([], b'C') => Some(Key::Right),
        ([], b'D') => Some(Key::Left),
        ([], b'H') => Some(Key::Home),
        ([], b'F') => Some(Key::End),
        (b"1" | b"7", b'~') => Some(Key::Home),
        (b"4" | b"8", b'~') => Some(Key::End),
        (b"3", b'~') => Some(Key::Delete),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<Key> {
        let mut decoder = KeyDecoder::new();
        bytes.iter().filter_map(|b| decoder.feed(*b)).collect()
    }

    #[test]
    fn printable_and_control_bytes() {
        assert_eq!(
            decode(b"a\x03\r\x7f\x08\t"),
            [
                Key::Char('a'),
                Key::Ctrl('c'),
                Key::Enter,
                Key::Backspace,
                Key::Backspace,
                Key::Tab
            ]
        );
    }

    #[test]
    fn arrow_and_editing_sequences() {
        assert_eq!(
            decode(b"\x1b[A\x1b[B\x1b[C\x1b[D\x1b[H\x1b[F\x1b[3~\x1bOH\x1bOF\x1b[1~\x1b[4~"),
            [
                Key::Up,
                Key::Down,
                Key::Right,
                Key::Left,
                Key::Home,
                Key::End,
                Key::Delete,
                Key::Home,
                Key::End,
                Key::Home,
                Key::End
            ]
        );
    }

    #[test]
    fn unknown_sequences_are_swallowed_whole() {
        assert_eq!(decode(b"\x1b[1;5Cx"), [Key::Char('x')]);
        assert_eq!(decode(b"\x1b[200~y"), [Key::Char('y')]);
        assert_eq!(decode(b"\x1bxz"), [Key::Char('z')]);
    }

    #[test]
    fn over_long_csi_is_swallowed_to_its_final_byte() {
        assert_eq!(decode(b"\x1b[1;2;3;4;5;6;7;8;9;10~x"), [Key::Char('x')]);
        let mut decoder = KeyDecoder::new();
        for byte in b"\x1b[1;2;3;4;5;6;7;8;9;10" {
            assert_eq!(decoder.feed(*byte), None);
        }
        assert!(decoder.is_pending());
        assert_eq!(decoder.feed(b'~'), None);
        assert!(!decoder.is_pending());
    }

    #[test]
    fn repeated_escape_restarts_the_sequence() {
        assert_eq!(decode(b"\x1b\x1b[A"), [Key::Up]);
        assert_eq!(decode(b"\x1b\x1b\x1bOHz"), [Key::Home, Key::Char('z')]);
    }

    #[test]
    fn stray_bytes_are_ignored() {
        assert!(decode(&[0x00, 0x1c, 0x1f, 0x80, 0xff]).is_empty());
    }

    #[test]
    fn utf8_sequences_become_chars() {
        assert_eq!(decode("é漢🦀".as_bytes()), [
            Key::Char('é'),
            Key::Char('漢'),
            Key::Char('🦀')
        ]);
    }

    #[test]
    fn broken_utf8_recovers_on_next_byte() {
        assert_eq!(decode(&[0xc3, b'a']), [Key::Char('a')]);
    }

    #[test]
    fn pending_state_is_visible() {
        let mut decoder = KeyDecoder::new();
        assert_eq!(decoder.feed(0x1b), None);
        assert!(decoder.is_pending());
        assert_eq!(decoder.feed(b'['), None);
        assert_eq!(decoder.feed(b'D'), Some(Key::Left));
        assert!(!decoder.is_pending());
    }
}
