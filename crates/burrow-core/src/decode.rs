//! Text decoding: UTF-8 first, detector-assisted, configured fallback.
//!
//! Decoding is total -- the fallback is a single-byte charset covering
//! the whole byte range, so every payload decodes to *something*.

use encoding_rs::Encoding;

/// Default fallback charset for non-UTF-8 servers.
pub const DEFAULT_FALLBACK: &str = "iso-8859-1";

/// Optional charset-detection capability.
///
/// Absence is not an error, only a reduced-accuracy path: without a
/// detector the decoder goes straight to the configured fallback.
pub trait CharsetDetector {
    /// Guess the charset of `bytes`, returning a WHATWG encoding label
    /// and a confidence in `0.0..=1.0`.
    fn detect(&self, bytes: &[u8]) -> Option<(String, f32)>;
}

/// Minimum detector confidence worth trusting.
const MIN_CONFIDENCE: f32 = 0.5;

/// Decode raw bytes to text.
///
/// Strict UTF-8 first; then the detector's guess when it is confident
/// enough and names a known encoding; then `fallback_label` (an unknown
/// label falls back to windows-1252, the WHATWG reading of latin-1).
pub fn decode(bytes: &[u8], fallback_label: &str, detector: Option<&dyn CharsetDetector>) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }

    if let Some(det) = detector
        && let Some((label, confidence)) = det.detect(bytes)
        && confidence > MIN_CONFIDENCE
        && let Some(encoding) = Encoding::for_label(label.as_bytes())
    {
        log::debug!("charset detector chose {label} ({confidence:.2})");
        let (text, _, _) = encoding.decode(bytes);
        return text.into_owned();
    }

    let encoding =
        Encoding::for_label(fallback_label.as_bytes()).unwrap_or(encoding_rs::WINDOWS_1252);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// Whether `label` names a charset the decoder can use as a fallback.
pub fn known_charset(label: &str) -> bool {
    Encoding::for_label(label.as_bytes()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDetector {
        label: &'static str,
        confidence: f32,
    }

    impl CharsetDetector for FixedDetector {
        fn detect(&self, _bytes: &[u8]) -> Option<(String, f32)> {
            Some((self.label.to_string(), self.confidence))
        }
    }

    #[test]
    fn valid_utf8_decodes_via_utf8_path() {
        let text = "smörgåsbord, åäö";
        assert_eq!(decode(text.as_bytes(), DEFAULT_FALLBACK, None), text);
    }

    #[test]
    fn invalid_utf8_uses_fallback() {
        // 0xE9 is é in latin-1 / windows-1252.
        let bytes = b"caf\xE9";
        assert_eq!(decode(bytes, DEFAULT_FALLBACK, None), "café");
    }

    #[test]
    fn confident_detector_wins() {
        // 0xE4 is Д in koi8-r but ä in latin-1.
        let bytes = b"\xE4";
        let det = FixedDetector {
            label: "koi8-r",
            confidence: 0.9,
        };
        assert_eq!(decode(bytes, DEFAULT_FALLBACK, Some(&det)), "Д");
    }

    #[test]
    fn unconfident_detector_is_ignored() {
        let bytes = b"\xE4";
        let det = FixedDetector {
            label: "koi8-r",
            confidence: 0.3,
        };
        // Falls through to latin-1: 0xE4 is ä.
        assert_eq!(decode(bytes, DEFAULT_FALLBACK, Some(&det)), "ä");
    }

    #[test]
    fn detector_with_unknown_label_is_ignored() {
        let bytes = b"\xE4";
        let det = FixedDetector {
            label: "no-such-charset",
            confidence: 0.9,
        };
        assert_eq!(decode(bytes, DEFAULT_FALLBACK, Some(&det)), "ä");
    }

    #[test]
    fn unknown_fallback_label_still_decodes() {
        let bytes = b"\xE4";
        assert_eq!(decode(bytes, "not-a-charset", None), "ä");
    }

    #[test]
    fn known_charset_lookup() {
        assert!(known_charset("utf-8"));
        assert!(known_charset("iso-8859-1"));
        assert!(known_charset("koi8-r"));
        assert!(!known_charset("martian-9"));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn decoding_is_total(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
                // Any byte soup decodes without panicking, detector or not.
                let _ = decode(&bytes, DEFAULT_FALLBACK, None);
                let det = FixedDetector { label: "koi8-r", confidence: 0.9 };
                let _ = decode(&bytes, DEFAULT_FALLBACK, Some(&det));
            }

            #[test]
            fn utf8_round_trips(text in "\\PC{0,100}") {
                prop_assert_eq!(decode(text.as_bytes(), DEFAULT_FALLBACK, None), text);
            }
        }
    }
}
