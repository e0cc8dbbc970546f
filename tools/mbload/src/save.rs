//! Turn a file into Python statements that write it to the board's flash.

/// Bytes sent per `f(...)` call. Keeps each raw-REPL chunk well inside the
/// board's input buffer.
pub const CHUNK_SIZE: usize = 64;

/// Statements that recreate `contents` as `filename` on the board, meant to be
/// run one at a time through the raw REPL.
pub fn make_save_script(contents: &[u8], filename: &str) -> Vec<String> {
    let mut script = Vec::with_capacity(contents.len().div_ceil(CHUNK_SIZE) + 2);
    script.push(format!(
        "fd = open({}, \"wb\")\nf = fd.write",
        string_literal(filename)
    ));
    for chunk in contents.chunks(CHUNK_SIZE) {
        script.push(format!("f({})", bytes_literal(chunk)));
    }
    script.push("fd.close()".to_string());
    script
}

/// A Python `bytes` literal for `data`, quoted the same way Python's own
/// `repr()` would.
pub fn bytes_literal(data: &[u8]) -> String {
    let quote = if data.contains(&b'\'') && !data.contains(&b'"') {
        b'"'
    } else {
        b'\''
    };

    let mut out = String::with_capacity(data.len() + 3);
    out.push('b');
    out.push(quote as char);
    for &byte in data {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b if b == quote => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7E => out.push(byte as char),
            _ => out.push_str(&format!("\\x{:02x}", byte)),
        }
    }
    out.push(quote as char);
    out
}

/// Double-quoted Python string literal. Non-ASCII characters are passed
/// through; MicroPython source is UTF-8.
fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
