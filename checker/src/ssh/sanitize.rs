//! Terminal output cleanup
//!
//! Session output arrives as raw pseudo-terminal bytes: colour codes, cursor
//! movement, window titles and `\r` overwrites. Parsers only ever see the
//! result of [`sanitize_lines`].

use regex::Regex;
use std::sync::LazyLock;

// OSC (window title, hyperlinks), terminated by BEL or ST
static OSC_SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\][^\x07\x1B]*(?:\x07|\x1B\\)").unwrap());

// 7-bit ESC or 8-bit C1 introducer, parameter bytes, intermediate bytes, final byte
static ESCAPE_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\x1B[@-_]|[\x{80}-\x{9F}])[0-?]*[ -/]*[@-~]").unwrap()
});

/// Strip control sequences and split into non-empty lines.
///
/// `\r` separates fragments just like `\n`; overwritten fragments are kept in
/// order rather than resolved.
pub fn sanitize_lines(raw: &str) -> Vec<String> {
    let without_osc = OSC_SEQUENCE.replace_all(raw, "");
    let stripped = ESCAPE_SEQUENCE.replace_all(&without_osc, "");

    stripped
        .split('\n')
        .flat_map(|line| line.split('\r'))
        .map(|fragment| {
            fragment
                .chars()
                .filter(|c| !is_stray_control(*c))
                .collect::<String>()
        })
        .filter(|fragment| !fragment.is_empty())
        .collect()
}

/// Lossy UTF-8 decode followed by [`sanitize_lines`]
pub fn sanitize_bytes(raw: &[u8]) -> Vec<String> {
    sanitize_lines(&String::from_utf8_lossy(raw))
}

fn is_stray_control(c: char) -> bool {
    c.is_control() && c != '\t'
}
