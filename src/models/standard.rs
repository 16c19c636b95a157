use serde::{Deserialize, Serialize};

/// A compliance standard the scanner reports against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Standard {
    pub id: String,
    pub name: String,
    pub summary: String,
    /// Lowercase tokens that make this standard relevant to a piece of code
    pub keywords: Vec<String>,
}

impl Standard {
    pub fn new(id: &str, name: &str, summary: &str, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            summary: summary.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn pci_dss() -> Self {
        Self::new(
            "PCI-DSS",
            "Payment Card Industry Data Security Standard",
            "PCI-DSS requires encryption of cardholder data, secure transmission, access controls, and regular security testing.",
            &["card", "payment", "pan", "cvv", "stripe", "billing"],
        )
    }

    pub fn soc2() -> Self {
        Self::new(
            "SOC2",
            "SOC 2 Type II",
            "SOC2 Type II requires security controls for confidentiality, availability, processing integrity, and privacy.",
            &[],
        )
    }

    pub fn hipaa() -> Self {
        Self::new(
            "HIPAA",
            "Health Insurance Portability and Accountability Act",
            "HIPAA requires safeguards for PHI including encryption, access controls, audit logs, and breach notification.",
            &["patient", "health", "phi", "medical", "diagnosis"],
        )
    }

    pub fn gdpr() -> Self {
        Self::new(
            "GDPR",
            "General Data Protection Regulation",
            "GDPR requires data protection by design, consent management, data minimization, and breach notification.",
            &["email", "personal", "consent", "address", "birth", "user_data"],
        )
    }

    pub fn owasp() -> Self {
        Self::new(
            "OWASP",
            "OWASP Top 10",
            "OWASP Top 10 covers injection, broken authentication, sensitive data exposure, and security misconfigurations.",
            &[],
        )
    }

    pub fn all_standards() -> Vec<Self> {
        vec![
            Standard::pci_dss(),
            Standard::soc2(),
            Standard::hipaa(),
            Standard::gdpr(),
            Standard::owasp(),
        ]
    }

    /// Standards without keywords apply to every file
    pub fn is_relevant_to(&self, lowercase_text: &str) -> bool {
        self.keywords.is_empty() || self.keywords.iter().any(|k| lowercase_text.contains(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_standards() {
        let standards = Standard::all_standards();
        assert_eq!(standards.len(), 5);

        let ids: Vec<&str> = standards.iter().map(|s| s.id.as_str()).collect();
        assert!(ids.contains(&"PCI-DSS"));
        assert!(ids.contains(&"SOC2"));
        assert!(ids.contains(&"HIPAA"));
        assert!(ids.contains(&"GDPR"));
        assert!(ids.contains(&"OWASP"));
    }

    #[test]
    fn test_hipaa_summary_mentions_phi() {
        let hipaa = Standard::hipaa();
        assert!(hipaa.summary.contains("PHI"));
        assert!(hipaa.name.contains("Health"));
    }

    #[test]
    fn test_keyword_relevance() {
        assert!(Standard::pci_dss().is_relevant_to("charge the card on file"));
        assert!(!Standard::pci_dss().is_relevant_to("resource \"aws_vpc\" \"main\" {}"));
        assert!(Standard::owasp().is_relevant_to("anything at all"));
    }

    #[test]
    fn test_standard_serde() {
        let standard = Standard::gdpr();
        let json = serde_json::to_string(&standard).unwrap();
        let deserialized: Standard = serde_json::from_str(&json).unwrap();
        assert_eq!(standard, deserialized);
    }
}
