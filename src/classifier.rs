//! Keyword classification of ticket descriptions into issue types.
//!
//! Categories are tried in declaration order and the first one with a
//! keyword present (case-insensitive substring) wins. Keyword sets overlap
//! on purpose, so the order below is part of the behavior.

pub const OTHER: &str = "Other";

/// Ordered `(label, keywords)` table. Labels are exactly what reports and
/// narratives show.
pub const CATEGORIES: &[(&str, &[&str])] = &[
    ("Citrix", &["citrix", "vdi"]),
    ("MFA", &["mfa", "otp", "authenticator", "notification"]),
    (
        "Endpoint Compliance",
        &[
            "endpoint",
            "compliance",
            "dlp",
            "edr",
            "tanium",
            "pmc",
            "encryption",
            "bitlocker",
            "hostname",
            "sensor",
            "sense",
        ],
    ),
    (
        "Network/VPN",
        &["vpn", "zscaler", "network", "anyconnect", "proxy", "isp"],
    ),
    (
        "Access/Password",
        &["password", "access", "unlock", "reset", "sspr", "credential"],
    ),
];

/// Every label `classify` can return, in priority order, `Other` last.
pub fn labels() -> impl Iterator<Item = &'static str> {
    CATEGORIES
        .iter()
        .map(|(label, _)| *label)
        .chain(std::iter::once(OTHER))
}

pub fn classify(text: Option<&str>) -> &'static str {
    let Some(text) = text else {
        return OTHER;
    };
    let t = text.to_lowercase();
    if t.trim().is_empty() {
        return OTHER;
    }
    CATEGORIES
        .iter()
        .find(|(_, keys)| keys.iter().any(|k| t.contains(k)))
        .map(|(label, _)| *label)
        .unwrap_or(OTHER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_text_is_other() {
        assert_eq!(classify(None), OTHER);
        assert_eq!(classify(Some("")), OTHER);
        assert_eq!(classify(Some("   ")), OTHER);
    }

    #[test]
    fn matches_case_insensitively() {
        assert_eq!(classify(Some("CITRIX workspace not launching")), "Citrix");
        assert_eq!(classify(Some("BitLocker recovery key")), "Endpoint Compliance");
        assert_eq!(classify(Some("Zscaler blocks site")), "Network/VPN");
        assert_eq!(classify(Some("Account unlock")), "Access/Password");
    }

    #[test]
    fn first_declared_category_wins() {
        assert_eq!(classify(Some("VPN access reset via SSPR")), "Network/VPN");
        // "vdi" (Citrix) beats "notification" (MFA)
        assert_eq!(classify(Some("VDI notification popup")), "Citrix");
    }

    #[test]
    fn unmatched_text_is_other() {
        assert_eq!(classify(Some("Printer jammed")), OTHER);
    }

    #[test]
    fn output_is_always_a_declared_label() {
        let inputs = [
            "mfa push",
            "endpoint compliance failed",
            "laptop slow",
            "OTP not received",
            "proxy error",
        ];
        let known: Vec<&str> = labels().collect();
        for text in inputs {
            let first = classify(Some(text));
            assert!(known.contains(&first), "{first} is not a declared label");
            assert_eq!(first, classify(Some(text)));
        }
    }

    #[test]
    fn keywords_are_lowercase() {
        for (label, keys) in CATEGORIES {
            for k in *keys {
                assert_eq!(*k, k.to_lowercase(), "{label} keyword {k} must be lowercase");
            }
        }
    }
}
