//! Local file names for saved downloads.

use url::Url;

/// Used when the URL path yields nothing usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// One file name per URL, in order. Later duplicates get `-<n>` appended
/// before the extension so no two downloads share a file.
pub(crate) fn file_names(urls: &[String]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls {
        let base = filename_from_url(url);
        let mut name = base.clone();
        let mut n = 1;
        while names.contains(&name) {
            name = with_suffix(&base, n);
            n += 1;
        }
        names.push(name);
    }
    names
}

/// Last non-empty path segment of `url`, sanitized.
fn filename_from_url(url: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segs| segs.rfind(|s| !s.is_empty()).map(str::to_string))
    });
    let sanitized = segment.map(|s| sanitize(&s)).unwrap_or_default();
    if sanitized.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        sanitized
    }
}

/// Replace path separators and control characters, trim dots and spaces.
fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c == '\0' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    replaced.trim_matches(|c| c == ' ' || c == '.').to_string()
}

fn with_suffix(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", name, n),
    }
}
