/// Canonical comparable form of a place name.
///
/// Lower-cases the input and keeps only ASCII letters and digits. Characters
/// outside that range (accents, punctuation, whitespace, other scripts) are
/// dropped rather than transliterated, so `"São Paulo"` becomes `"sopaulo"`.
/// The function is total and idempotent.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalize in place, reusing the allocation.
pub fn normalize_in_place(value: &mut String) {
    value.retain(|c| c.is_ascii_alphanumeric());
    value.make_ascii_lowercase();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_and_lowercases() {
        assert_eq!(normalize("New York"), "newyork");
        assert_eq!(normalize("Saint-Étienne"), "sainttienne");
        assert_eq!(normalize("  L'Aquila (AQ) "), "laquilaaq");
        assert_eq!(normalize("District 9"), "district9");
        assert_eq!(normalize("東京"), "");
    }

    #[test]
    fn test_normalize_empty_and_idempotent() {
        let samples = [
            "",
            "   ",
            "Paris",
            "PARRIS",
            "São Paulo",
            "Ho Chi Minh City",
            "Zürich-Flughafen",
            "123 abc DEF !?",
            "\u{0130}stanbul",
        ];

        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
            assert!(
                once.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
                "unexpected character in {:?}",
                once
            );
        }
    }

    #[test]
    fn test_normalize_in_place_matches_normalize() {
        let mut value = "Rio de Janeiro!".to_string();
        normalize_in_place(&mut value);
        assert_eq!(value, normalize("Rio de Janeiro!"));
    }
}
