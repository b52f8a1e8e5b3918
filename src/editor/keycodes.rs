//! Key-code debugging: echo every raw byte the terminal sends.

use std::io::{self, Read, Write};

/// Typing this word ends the dump.
const QUIT_WORD: &[u8; 4] = b"quit";

/// Header shown before the dump starts.
pub const KEYCODES_BANNER: &str = "Key codes debugging mode.\nPress keys to see scan codes. Type 'quit' at any time to exit.\n";

/// Print `'c' 0xNN (N)` for each byte read until `quit` is typed or the input
/// closes. Lines end in `\r\n` because output post-processing is off in raw mode.
pub fn dump_keycodes<R: Read, W: Write>(input: &mut R, output: &mut W) -> io::Result<()> {
    let mut recent = [0u8; 4];
    let mut byte = [0u8; 1];
    loop {
        if input.read(&mut byte)? == 0 {
            return Ok(());
        }
        let b = byte[0];
        write!(output, "'{}' 0x{b:02x} ({b})\r\n", label(b))?;
        output.flush()?;

        recent.rotate_left(1);
        recent[3] = b;
        if &recent == QUIT_WORD {
            return Ok(());
        }
    }
}

fn label(byte: u8) -> String {
    match byte {
        b'\r' => "\\r".to_string(),
        b'\n' => "\\n".to_string(),
        b'\t' => "\\t".to_string(),
        0x1b => "ESC".to_string(),
        0x20..=0x7e => char::from(byte).to_string(),
        _ => "?".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_stops_after_quit() {
        let mut input: &[u8] = b"\x1bquitmore";
        let mut output = Vec::new();
        dump_keycodes(&mut input, &mut output).unwrap();
        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(
            lines,
            [
                "'ESC' 0x1b (27)",
                "'q' 0x71 (113)",
                "'u' 0x75 (117)",
                "'i' 0x69 (105)",
                "'t' 0x74 (116)"
            ]
        );
        assert_eq!(input, b"more");
    }

    #[test]
    fn control_bytes_get_readable_labels() {
        let mut input: &[u8] = b"\r\x03";
        let mut output = Vec::new();
        dump_keycodes(&mut input, &mut output).unwrap();
        assert_eq!(output, b"'\\r' 0x0d (13)\r\n'?' 0x03 (3)\r\n");
    }
}
