//! Static country lookup table and jurisdiction labels.
//!
//! The local file buckets tax rates under country (and optionally state)
//! keys, while the flat catalog identifies a tax rate by a single
//! jurisdiction label: the country code alone (`"US"`) or state and country
//! joined (`"CA, US"`). The store uses both lookup directions so country
//! keys in the file may be written as either a code or a full country name.

/// ISO 3166-1 alpha-2 code to English short name.
const COUNTRIES: &[(&str, &str)] = &[
    ("AR", "Argentina"),
    ("AT", "Austria"),
    ("AU", "Australia"),
    ("BE", "Belgium"),
    ("BR", "Brazil"),
    ("CA", "Canada"),
    ("CH", "Switzerland"),
    ("CL", "Chile"),
    ("CN", "China"),
    ("CO", "Colombia"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("EE", "Estonia"),
    ("ES", "Spain"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("GR", "Greece"),
    ("HK", "Hong Kong"),
    ("HU", "Hungary"),
    ("ID", "Indonesia"),
    ("IE", "Ireland"),
    ("IL", "Israel"),
    ("IN", "India"),
    ("IT", "Italy"),
    ("JP", "Japan"),
    ("KR", "South Korea"),
    ("LT", "Lithuania"),
    ("LU", "Luxembourg"),
    ("LV", "Latvia"),
    ("MX", "Mexico"),
    ("MY", "Malaysia"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("NZ", "New Zealand"),
    ("PE", "Peru"),
    ("PH", "Philippines"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("RO", "Romania"),
    ("SE", "Sweden"),
    ("SG", "Singapore"),
    ("SK", "Slovakia"),
    ("TH", "Thailand"),
    ("TR", "Turkey"),
    ("TW", "Taiwan"),
    ("US", "United States"),
    ("VN", "Vietnam"),
    ("ZA", "South Africa"),
];

/// Look up the English name for a country code.
pub fn country_name(code: &str) -> Option<&'static str> {
    COUNTRIES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Reverse lookup: country code for an English name.
pub fn country_code(name: &str) -> Option<&'static str> {
    COUNTRIES
        .iter()
        .find(|(_, n)| n.eq_ignore_ascii_case(name))
        .map(|(code, _)| *code)
}

/// Build the flat jurisdiction label for a country and optional state.
pub fn jurisdiction_label(country: &str, state: Option<&str>) -> String {
    match state {
        Some(state) => format!("{}, {}", state, country),
        None => country.to_string(),
    }
}

/// Split a jurisdiction label back into `(country, state)` codes.
pub fn parse_jurisdiction(label: &str) -> (String, Option<String>) {
    match label.split_once(',') {
        Some((state, country)) => (
            country.trim().to_string(),
            Some(state.trim().to_string()),
        ),
        None => (label.trim().to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_name() {
        assert_eq!(country_name("US"), Some("United States"));
        assert_eq!(country_name("us"), Some("United States"));
        assert_eq!(country_name("XX"), None);
    }

    #[test]
    fn test_country_code() {
        assert_eq!(country_code("United States"), Some("US"));
        assert_eq!(country_code("united kingdom"), Some("GB"));
        assert_eq!(country_code("Atlantis"), None);
    }

    #[test]
    fn test_lookups_are_inverse() {
        for (code, name) in COUNTRIES {
            assert_eq!(country_code(name), Some(*code));
            assert_eq!(country_name(code), Some(*name));
        }
    }

    #[test]
    fn test_jurisdiction_label() {
        assert_eq!(jurisdiction_label("US", None), "US");
        assert_eq!(jurisdiction_label("US", Some("CA")), "CA, US");
    }

    #[test]
    fn test_parse_jurisdiction() {
        assert_eq!(parse_jurisdiction("US"), ("US".to_string(), None));
        assert_eq!(
            parse_jurisdiction("CA, US"),
            ("US".to_string(), Some("CA".to_string()))
        );
        assert_eq!(
            parse_jurisdiction("CA,US"),
            ("US".to_string(), Some("CA".to_string()))
        );
    }

    #[test]
    fn test_label_round_trips() {
        let label = jurisdiction_label("US", Some("CA"));
        let (country, state) = parse_jurisdiction(&label);
        assert_eq!(jurisdiction_label(&country, state.as_deref()), label);
    }
}
