//! Content classification: mapping an item to a MIME type.
//!
//! Precedence: protocol itemtype, then selector file extension, then
//! magic-number sniffing, with a final category correction for `I`
//! (image) and `s` (sound) items whose inferred MIME disagrees with the
//! protocol-declared kind. Classification never fails.

/// Fallback MIME when nothing matches.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extension table for the last path segment of a selector.
const EXTENSION_MIMES: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("md", "text/plain"),
    ("html", "text/html"),
    ("htm", "text/html"),
    ("xml", "text/xml"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("bmp", "image/bmp"),
    ("pdf", "application/pdf"),
    ("ps", "application/postscript"),
    ("mp3", "audio/mpeg"),
    ("ogg", "audio/ogg"),
    ("wav", "audio/x-wav"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tgz", "application/gzip"),
    ("tar", "application/x-tar"),
];

/// Classify an item's content as a MIME type.
///
/// `itemtype` and `selector` come from the item's address; `bytes` is
/// the fetched payload for sniffing.
pub fn classify(itemtype: char, selector: &str, bytes: &[u8]) -> String {
    // 1. Protocol-declared types that fully determine the MIME.
    match itemtype {
        '0' | '1' => return "text/plain".to_string(),
        'h' => return "text/html".to_string(),
        'g' => return "image/gif".to_string(),
        _ => {},
    }

    // 2.-3. Extension, then content sniffing.
    let mime = from_extension(selector)
        .map(str::to_string)
        .unwrap_or_else(|| sniff(bytes).to_string());

    // 4. The protocol-declared item kind is authoritative over content
    //    inference when they disagree on broad category.
    match itemtype {
        'I' if !mime.starts_with("image/") => "image/jpeg".to_string(),
        's' if !mime.starts_with("audio/") => "audio/mpeg".to_string(),
        _ => mime,
    }
}

/// Look up the extension of the selector's last path segment.
fn from_extension(selector: &str) -> Option<&'static str> {
    let segment = selector.rsplit('/').next()?;
    let ext = segment.rsplit('.').next()?;
    if ext.len() == segment.len() {
        return None; // no dot at all
    }
    let ext = ext.to_ascii_lowercase();
    EXTENSION_MIMES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
}

/// Guess a MIME type from the first bytes of the payload.
fn sniff(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.starts_with(b"BM") && bytes.len() > 14 {
        "image/bmp"
    } else if bytes.starts_with(b"%PDF") {
        "application/pdf"
    } else if bytes.starts_with(b"ID3") || bytes.starts_with(&[0xFF, 0xFB]) {
        "audio/mpeg"
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WAVE".as_slice()) {
        "audio/x-wav"
    } else if bytes.starts_with(b"PK\x03\x04") {
        "application/zip"
    } else if bytes.starts_with(&[0x1F, 0x8B]) {
        "application/gzip"
    } else if looks_like_html(bytes) {
        "text/html"
    } else if looks_like_text(bytes) {
        "text/plain"
    } else {
        OCTET_STREAM
    }
}

fn looks_like_html(bytes: &[u8]) -> bool {
    let head: Vec<u8> = bytes
        .iter()
        .take(64)
        .map(u8::to_ascii_lowercase)
        .collect();
    let head = String::from_utf8_lossy(&head);
    let head = head.trim_start();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

/// Heuristic: decodes as UTF-8 and carries no control bytes other than
/// whitespace.
fn looks_like_text(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(1024)];
    match std::str::from_utf8(sample) {
        Ok(text) => !text
            .chars()
            .any(|c| c.is_control() && c != '\n' && c != '\r' && c != '\t'),
        // A multi-byte sequence may be cut at the sample boundary.
        Err(e) => e.valid_up_to() + 4 >= sample.len() && e.error_len().is_none(),
    }
}
