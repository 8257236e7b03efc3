//! Prompt marker protocol
//!
//! The session installs a synthetic prompt that embeds the shell's last exit
//! status: `[SBRIDGE_<exitcode>]$ `. Completion detection and exit-status
//! extraction both reduce to scanning captures for this marker.
//!
//! Captures return the whole visible+scrollback buffer every time, so a scan
//! must find *all* occurrences, not just the last. In steady state a capture
//! holds zero or one marker (history is cleared after each completed
//! command), but chained commands and races can leave more; reconstruction
//! handles any count idempotently.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prompt value exported into the shell; `$?` is expanded at display time
pub const PROMPT_PS1: &str = r"[SBRIDGE_$?]$ ";

/// Literal tail of every rendered marker
pub const PROMPT_END: &str = "]$ ";

/// Compiled marker pattern with the exit status as its one capture group
static MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[SBRIDGE_(\d+)\]\$ ").expect("marker pattern is valid"));

/// A single marker occurrence in a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// Byte offset of the marker start
    pub start: usize,
    /// Byte offset just past the marker (past the trailing space)
    pub end: usize,
    /// Exit status parsed from the capture group, when it fits
    pub exit_code: Option<i32>,
}

/// Shell line that installs the marker prompt
///
/// `PROMPT_COMMAND` re-exports `PS1` before every prompt so the embedded
/// `$?` is expanded fresh each time; `PS2` is emptied so multi-line
/// continuations never pollute captures.
pub fn init_line() -> String {
    format!(
        "export PROMPT_COMMAND='export PS1=\"{}\"'; export PS2=\"\"",
        PROMPT_PS1
    )
}

/// Find every marker occurrence in a capture, in order
pub fn scan(content: &str) -> Vec<Marker> {
    MARKER
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Marker {
                start: whole.start(),
                end: whole.end(),
                exit_code: caps.get(1).and_then(|code| code.as_str().parse().ok()),
            })
        })
        .collect()
}

/// Exit status of the most recent marker; `None` when no marker was seen or
/// its digits did not parse
pub fn last_exit_code(markers: &[Marker]) -> Option<i32> {
    markers.last().and_then(|m| m.exit_code)
}

/// True when the buffer tail shows a prompt: either a bare marker prompt or
/// a marker trailing the buffer. A marker elsewhere in the buffer does not
/// count; output may scroll past old prompts while a command runs.
pub fn ends_at_prompt(content: &str) -> bool {
    content.trim_end().ends_with(PROMPT_END.trim_end())
}

/// Reconstruct the transcript between markers
///
/// Zero markers: the whole buffer (mid-flight command, no segmentation
/// possible). One: everything after the marker. More: the text strictly
/// between each consecutive pair joined by newlines, then the remainder
/// after the final marker. Surrounding whitespace is trimmed.
pub fn reconstruct(content: &str, markers: &[Marker]) -> String {
    let combined = match markers {
        [] => content.to_string(),
        [only] => content[only.end..].to_string(),
        _ => {
            let mut combined = String::new();
            for pair in markers.windows(2) {
                combined.push_str(&content[pair[0].end..pair[1].start]);
                combined.push('\n');
            }
            if let Some(last) = markers.last() {
                combined.push_str(&content[last.end..]);
            }
            combined
        }
    };
    combined.trim().to_string()
}

/// Strip a single leading command-echo line when it reproduces the
/// submitted command
pub fn strip_command_echo<'a>(output: &'a str, command: &str) -> &'a str {
    let command = command.trim();
    if command.is_empty() {
        return output;
    }
    match output.split_once('\n') {
        Some((first, rest)) if first.contains(command) => rest,
        None if output.contains(command) => "",
        _ => output,
    }
}
