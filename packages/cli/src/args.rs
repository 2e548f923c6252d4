// ABOUTME: Parsing helpers for command-line arguments
// ABOUTME: Turns `-H key=value` flags into record headers

use courier_records::Header;

/// Parse `key=value` (or `key: value`) into a header. The key must be
/// non-empty; the value may be empty.
pub fn parse_header(raw: &str) -> Result<Header, String> {
    let (key, value) = raw
        .split_once('=')
        .or_else(|| raw.split_once(':'))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("header key is empty in '{}'", raw));
    }

    Ok(Header::new(key, value.trim()))
}
