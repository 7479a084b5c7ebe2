//! Character encoding detection and strict decoding for delimited text uploads.

use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use serde::Serialize;
use std::borrow::Cow;

/// Guesses below this confidence fall back to the default encoding
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;

/// How an encoding was chosen
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingSource {
    /// A byte-order mark at the start of the buffer
    Bom,
    /// The statistical guess was confident enough
    Detected,
    /// The guess was weak or unknown, the fallback was used
    Fallback,
}

/// Result of encoding detection
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct DetectedEncoding {
    #[serde(serialize_with = "serialize_encoding")]
    pub encoding: &'static Encoding,
    /// Confidence reported by the detector, in `[0, 1]`
    pub confidence: f32,
    pub source: EncodingSource,
}

impl DetectedEncoding {
    /// WHATWG name of the chosen encoding
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }
}

fn serialize_encoding<S: serde::Serializer>(encoding: &&'static Encoding, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(encoding.name())
}

/// Resolves an encoding from a WHATWG label (`utf-8`, `latin1`, `windows-1252`)
/// or from a Windows code page number (`1252`, `936`).
pub fn parse_encoding(label: &str) -> Option<&'static Encoding> {
    let label = label.trim();
    match label.parse::<u16>() {
        Ok(code_page) => codepage::to_encoding(code_page),
        Err(_) => Encoding::for_label(label.as_bytes()),
    }
}

/// Guesses the encoding of `bytes`.
///
/// A byte-order mark wins outright. Otherwise the statistical guess is used
/// only when its confidence exceeds `min_confidence` and its label is known
/// to `encoding_rs`; in every other case `fallback` is returned. Never fails.
///
/// # Arguments
/// * `bytes` - Raw upload content
/// * `fallback` - Encoding used when the guess is not trustworthy
/// * `min_confidence` - Confidence the guess must exceed
pub fn detect_encoding(bytes: &[u8], fallback: &'static Encoding, min_confidence: f32) -> DetectedEncoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return DetectedEncoding {
            encoding,
            confidence: 1.0,
            source: EncodingSource::Bom,
        };
    }

    let (charset, confidence, _) = chardet::detect(&bytes.to_vec());
    let guess = Encoding::for_label(chardet::charset2encoding(&charset).as_bytes())
        .filter(|_| confidence > min_confidence);
    log::debug!("Encoding guess '{}' with confidence {:.2}", charset, confidence);
    match guess {
        Some(encoding) => DetectedEncoding {
            encoding,
            confidence,
            source: EncodingSource::Detected,
        },
        None => DetectedEncoding {
            encoding: fallback,
            confidence,
            source: EncodingSource::Fallback,
        },
    }
}

/// Guesses the encoding with the default fallback (UTF-8) and threshold (0.7)
pub fn detect_encoding_or_utf8(bytes: &[u8]) -> DetectedEncoding {
    detect_encoding(bytes, UTF_8, DEFAULT_MIN_CONFIDENCE)
}

/// Decodes `bytes` without replacement characters.
/// A leading byte-order mark is stripped and takes precedence over `encoding`.
/// Returns `None` when the content is malformed for the encoding.
pub(crate) fn decode_strict<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, length)) => (encoding, &bytes[length..]),
        None => (encoding, bytes),
    };
    encoding.decode_without_bom_handling_and_without_replacement(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::SHIFT_JIS;
    use encoding_rs::UTF_16LE;
    use encoding_rs::WINDOWS_1252;

    const JAPANESE_AGENCIES: &str = "代理店名,営業段階,電子カルテ\n\
        東京在宅医療センター,フル契約,はい\n\
        大阪訪問看護ステーション,無料プラン,いいえ\n\
        名古屋ホームヘルスケア株式会社,ライト契約,はい\n\
        札幌地域医療グループ,未契約,いいえ\n\
        福岡すこやか訪問看護,フル契約,はい\n";

    #[test]
    fn bom_wins() {
        let detected = detect_encoding_or_utf8(b"\xEF\xBB\xBFname,stage\n");
        assert_eq!(detected.encoding, UTF_8);
        assert_eq!(detected.source, EncodingSource::Bom);

        let detected = detect_encoding_or_utf8(b"\xFF\xFEn\x00");
        assert_eq!(detected.encoding, UTF_16LE);
    }

    #[test]
    fn empty_input_falls_back() {
        let detected = detect_encoding(b"", WINDOWS_1252, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(detected.encoding, WINDOWS_1252);
        assert_eq!(detected.source, EncodingSource::Fallback);
    }

    #[test]
    fn impossible_threshold_always_falls_back() {
        let detected = detect_encoding("agence,café,crème brûlée\n".as_bytes(), UTF_8, 1.0);
        assert_eq!(detected.encoding, UTF_8);
        assert_eq!(detected.source, EncodingSource::Fallback);
    }

    #[test]
    fn confident_guess_beats_fallback() {
        let text = JAPANESE_AGENCIES.repeat(8);
        let (bytes, _, unmappable) = SHIFT_JIS.encode(&text);
        assert!(!unmappable);

        let detected = detect_encoding(&bytes, UTF_8, DEFAULT_MIN_CONFIDENCE);
        assert_eq!(detected.source, EncodingSource::Detected);
        assert_eq!(detected.encoding, SHIFT_JIS);
        assert!(detected.confidence > DEFAULT_MIN_CONFIDENCE);
        assert_eq!(decode_strict(&bytes, detected.encoding).unwrap(), text);

        let detected = detect_encoding(&bytes, WINDOWS_1252, 0.0);
        assert_eq!(detected.source, EncodingSource::Detected);
        assert_eq!(detected.encoding, SHIFT_JIS);
    }

    #[test]
    fn multibyte_utf8_is_usable() {
        let text = "Agency Name,Stage\nÉcole Générale,Orders 360 Full\nÜber Straße Zürich,Freemium\nSão João,Lite\n";
        let detected = detect_encoding_or_utf8(text.as_bytes());
        let decoded = decode_strict(text.as_bytes(), detected.encoding).unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn parse_encoding_labels_and_code_pages() {
        assert_eq!(parse_encoding("utf-8"), Some(UTF_8));
        assert_eq!(parse_encoding(" latin1 "), Some(WINDOWS_1252));
        assert_eq!(parse_encoding("1252"), Some(WINDOWS_1252));
        assert_eq!(parse_encoding("65001"), Some(UTF_8));
        assert_eq!(parse_encoding("klingon"), None);
    }

    #[test]
    fn strict_decode_rejects_malformed() {
        assert!(decode_strict(b"abc\xFF\xFE\xFD", UTF_8).is_none());
        assert_eq!(decode_strict(b"caf\xE9", WINDOWS_1252).unwrap(), "café");
        assert_eq!(decode_strict(b"\xEF\xBB\xBFabc", WINDOWS_1252).unwrap(), "abc");
    }
}
