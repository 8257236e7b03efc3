//! Special-key classification and encoding
//!
//! Callers submit keystrokes as text: ordinary command lines, control
//! sequences (`C-c`, `^c`), function keys (`F1`-`F12`), or named
//! navigation/editing keys. Special keys are delivered to the terminal
//! without an appended newline and must be translated to the byte sequences
//! a terminal expects.

/// Named navigation and editing keys, including the multiplexer-style
/// aliases (`BSpace`, `DC`, `NPage`, ...) callers are used to.
const NAMED_KEYS: &[&str] = &[
    "Up", "Down", "Left", "Right", "Home", "End", "BSpace", "BTab", "DC", "Enter", "Escape", "IC",
    "Space", "Tab", "NPage", "PageDown", "PgDn", "PPage", "PageUp", "PgUp",
];

/// Classify input as a special key rather than an ordinary command line
pub fn is_special_key(input: &str) -> bool {
    let input = input.trim();
    if input.is_empty() {
        return false;
    }

    // Control keys (C-c, ^c, ...)
    if (input.starts_with("C-") || input.starts_with('^')) && input.len() >= 2 {
        return true;
    }

    // Function keys F1-F12
    if let Some(number) = input.strip_prefix('F') {
        if input.len() <= 3 {
            if let Ok(n) = number.parse::<u8>() {
                return (1..=12).contains(&n);
            }
        }
    }

    NAMED_KEYS.contains(&input)
}

/// Translate a special key name to the bytes a terminal expects
///
/// Returns `None` for anything that is not a special key; such text is sent
/// literally by the backend.
pub fn encode(input: &str) -> Option<Vec<u8>> {
    let input = input.trim();
    if !is_special_key(input) {
        return None;
    }

    // Control characters: C-x / ^x map to the ASCII control range
    let ctrl_char = input
        .strip_prefix("C-")
        .or_else(|| input.strip_prefix('^'));
    if let Some(rest) = ctrl_char {
        let c = rest.chars().next()?;
        if c.is_ascii_alphabetic() {
            return Some(vec![(c.to_ascii_uppercase() as u8) & 0x1f]);
        }
        return match c {
            '[' => Some(vec![0x1b]),
            '\\' => Some(vec![0x1c]),
            ']' => Some(vec![0x1d]),
            '^' => Some(vec![0x1e]),
            '_' => Some(vec![0x1f]),
            '@' | ' ' => Some(vec![0x00]),
            _ => None,
        };
    }

    // Function keys
    if let Some(number) = input.strip_prefix('F') {
        if let Ok(n) = number.parse::<u8>() {
            let seq: &[u8] = match n {
                1 => b"\x1bOP",
                2 => b"\x1bOQ",
                3 => b"\x1bOR",
                4 => b"\x1bOS",
                5 => b"\x1b[15~",
                6 => b"\x1b[17~",
                7 => b"\x1b[18~",
                8 => b"\x1b[19~",
                9 => b"\x1b[20~",
                10 => b"\x1b[21~",
                11 => b"\x1b[23~",
                12 => b"\x1b[24~",
                _ => return None,
            };
            return Some(seq.to_vec());
        }
    }

    let seq: &[u8] = match input {
        "Up" => b"\x1b[A",
        "Down" => b"\x1b[B",
        "Right" => b"\x1b[C",
        "Left" => b"\x1b[D",
        "Home" => b"\x1b[H",
        "End" => b"\x1b[F",
        "Tab" => b"\t",
        "BTab" => b"\x1b[Z",
        "Enter" => b"\r",
        "Escape" => b"\x1b",
        "Space" => b" ",
        "BSpace" => b"\x7f",
        "DC" => b"\x1b[3~",
        "IC" => b"\x1b[2~",
        "NPage" | "PageDown" | "PgDn" => b"\x1b[6~",
        "PPage" | "PageUp" | "PgUp" => b"\x1b[5~",
        _ => return None,
    };
    Some(seq.to_vec())
}
