/// Canonicalizes raw extracted text so pagination is stable.
///
/// A lone `\n` (no `\n` directly before or after it in the input) becomes a
/// space, which un-wraps hard-wrapped prose while runs of two or more
/// newlines survive as paragraph breaks. Runs of plain spaces, including ones
/// produced by the un-wrapping, collapse to a single space. Other whitespace
/// is left alone.
pub fn normalize(raw: &str) -> String {
    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = false;

    for (offset, ch) in raw.char_indices() {
        let ch = if ch == '\n' && is_lone_newline(bytes, offset) {
            ' '
        } else {
            ch
        };

        if ch == ' ' {
            if last_was_space {
                continue;
            }
            last_was_space = true;
        } else {
            last_was_space = false;
        }
        out.push(ch);
    }

    out
}

// `\n` is ASCII, so neighbouring bytes can be checked without decoding.
fn is_lone_newline(bytes: &[u8], offset: usize) -> bool {
    let before = offset > 0 && bytes[offset - 1] == b'\n';
    let after = bytes.get(offset + 1) == Some(&b'\n');
    !before && !after
}
