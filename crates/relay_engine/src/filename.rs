use percent_encoding::percent_decode_str;
use url::Url;

/// Used when neither the Content-Disposition header nor the URL path yields
/// a usable name.
pub const FALLBACK_FILENAME: &str = "download.bin";

/// Derives the filename suggested to clients: Content-Disposition first,
/// then the final URL's last path segment.
pub fn extract_filename(content_disposition: Option<&str>, final_url: &Url) -> String {
    if let Some(name) = content_disposition.and_then(filename_from_disposition) {
        return name;
    }
    filename_from_url(final_url)
}

/// Parses the `filename=` / `filename*=` parameter out of a
/// Content-Disposition header value. Handles the quoted, bare and
/// RFC 5987 `UTF-8''` forms; percent-escapes are decoded.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    // Prefer filename* when both parameters are present.
    let mut plain = None;
    for part in value.split(';') {
        let Some((key, raw)) = part.trim().split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                if let Some(name) = decode_parameter(raw, true) {
                    return Some(name);
                }
            }
            "filename" => {
                if plain.is_none() {
                    plain = decode_parameter(raw, false);
                }
            }
            _ => {}
        }
    }
    plain
}

fn decode_parameter(raw: &str, extended: bool) -> Option<String> {
    let mut raw = raw.trim();
    if extended {
        // RFC 5987 form: charset'language'value. Only UTF-8 is expected.
        if let Some((prefix, rest)) = raw.split_once("''") {
            if !prefix.to_ascii_lowercase().starts_with("utf-8") {
                return None;
            }
            raw = rest;
        }
    }
    let trimmed = raw.trim_matches('"').trim();
    if trimmed.is_empty() {
        return None;
    }
    let decoded = percent_decode_str(trimmed).decode_utf8().ok()?;
    let decoded = decoded.trim();
    (!decoded.is_empty()).then(|| decoded.to_string())
}

fn filename_from_url(url: &Url) -> String {
    let tail = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    let decoded = percent_decode_str(tail)
        .decode_utf8()
        .map(|s| s.to_string())
        .unwrap_or_else(|_| tail.to_string());
    if decoded.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        decoded
    }
}
