//! Pick the fields we need out of raw response header lines.

/// `Content-Type` of the final response.
///
/// With redirects curl reports every hop's headers; the last value wins.
pub(crate) fn content_type(lines: &[String]) -> Option<String> {
    let mut found = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-type") {
                found = Some(value.trim().to_string());
            }
        }
    }
    found
}

/// Media type without parameters, lowercased (`"Image/PNG; q=1"` -> `"image/png"`).
pub(crate) fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
