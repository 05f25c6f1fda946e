//! Demat account identifier extraction from transaction narrations
//!
//! Narrations carry free text ahead of the depository code, so both
//! heuristics favour the end of the string:
//! - NSDL: the token starting at the last `IN` in the whitespace-free text
//! - CDSL: the last 16 digits of the text

use std::sync::OnceLock;

use regex::Regex;

use crate::models::DematId;
use crate::parse::{compact_upper, last_16_digits};

fn nsdl_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^IN[0-9A-Z]+").expect("valid regex"))
}

/// Extract an NSDL `IN...` token anchored at the last `IN` occurrence
pub fn extract_nsdl(raw: &str) -> Option<String> {
    let compact = compact_upper(raw);
    let start = compact.rfind("IN")?;
    nsdl_token()
        .find(&compact[start..])
        .map(|m| m.as_str().to_string())
}

/// Extract a CDSL identifier as the last 16 digits of the text
pub fn extract_cdsl(raw: &str) -> Option<String> {
    last_16_digits(raw.trim())
}

/// Extract a demat identifier, preferring the NSDL form
///
/// Returns `None` when neither form is present; that is a normal outcome.
pub fn extract_demat(raw: &str) -> Option<DematId> {
    if let Some(token) = extract_nsdl(raw) {
        return Some(DematId::nsdl(token));
    }

    extract_cdsl(raw).map(DematId::cdsl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DematKind;

    #[test]
    fn test_extract_nsdl() {
        let id = extract_demat("PAYMENT REF IN123456XY").unwrap();
        assert_eq!(id.kind, DematKind::Nsdl);
        assert_eq!(id.value, "IN123456XY");
    }

    #[test]
    fn test_extract_nsdl_spaced_and_lowercase() {
        assert_eq!(
            extract_nsdl("off mkt trf to in 301234 5678 9012"),
            Some("IN30123456789012".to_string())
        );
    }

    #[test]
    fn test_extract_nsdl_uses_last_occurrence() {
        // "INTER" contains an earlier IN; the last one wins
        assert_eq!(
            extract_nsdl("INTER DP IN300999 10001234"),
            Some("IN30099910001234".to_string())
        );
    }

    #[test]
    fn test_extract_nsdl_stops_at_punctuation() {
        assert_eq!(extract_nsdl("TO IN300214/REF"), Some("IN300214".to_string()));
    }

    #[test]
    fn test_extract_cdsl() {
        let id = extract_demat("A/C NO 1234 5678 9012 3456").unwrap();
        assert_eq!(id.kind, DematKind::Cdsl);
        assert_eq!(id.value, "1234567890123456");
    }

    #[test]
    fn test_extract_cdsl_keeps_suffix() {
        assert_eq!(
            extract_cdsl("REF 99 1208160000123456"),
            Some("1208160000123456".to_string())
        );
    }

    #[test]
    fn test_bare_in_falls_back_to_cdsl() {
        // A trailing "IN" with nothing after it is not an NSDL token
        let id = extract_demat("1208 1600 0012 3456 IN").unwrap();
        assert_eq!(id.kind, DematKind::Cdsl);
        assert_eq!(id.value, "1208160000123456");
    }

    #[test]
    fn test_extract_none() {
        assert_eq!(extract_demat("CASH DIVIDEND 2024"), None);
        assert_eq!(extract_demat(""), None);
        assert_eq!(extract_demat("   "), None);
    }
}
