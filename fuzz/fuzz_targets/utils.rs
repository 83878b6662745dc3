use std::str;

/// PHP sources larger than this are not interesting for the lexer or the
/// migration scan and only slow the fuzzer down.
pub const MAX_INPUT_SIZE: usize = 64 * 1024;

/// UTF-8 prefix of `data` of at most `MAX_INPUT_SIZE` bytes.
///
/// When the cut lands inside a multibyte codepoint, up to 3 bytes are dropped.
#[inline]
pub fn truncate_utf8(data: &[u8]) -> Option<&str> {
    let cap = data.len().min(MAX_INPUT_SIZE);
    (0..=cap.min(3)).find_map(|trim| str::from_utf8(&data[..cap - trim]).ok())
}
