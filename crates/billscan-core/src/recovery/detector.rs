//! Garbled-text detection.

/// True when none of `keywords` occurs (case-sensitively) in `text`.
///
/// An empty keyword list means detection is disabled for the family and the
/// text is always taken as readable.
pub fn is_garbled(text: &str, keywords: &[&str]) -> bool {
    !keywords.is_empty() && !keywords.iter().any(|keyword| text.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAS: &[&str] = &["therm", "Therm", "THERM", "Delivery", "DELIVERY"];

    #[test]
    fn test_delivery_is_never_garbled() {
        assert!(!is_garbled("Total Delivery Services $ 31.07", GAS));
        assert!(!is_garbled("#$%&Delivery", &["kWh", "Delivery"]));
    }

    #[test]
    fn test_unit_keyword_is_not_garbled() {
        assert!(!is_garbled("In 30 days you used 54 therms", GAS));
    }

    #[test]
    fn test_missing_keywords_is_garbled() {
        assert!(is_garbled("7RWDO#FKDUJHV#'HOLYHU\\", GAS));
        assert!(is_garbled("", &["kWh", "KWH", "Delivery"]));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert!(is_garbled("delivery", &["kWh", "KWH", "Delivery"]));
    }

    #[test]
    fn test_detection_disabled() {
        assert!(!is_garbled("", &[]));
    }
}
