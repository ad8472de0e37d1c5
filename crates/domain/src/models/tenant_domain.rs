//! Tenant domain records extracted from federation metadata.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// An audience URI containing `@` followed by a dotted suffix. The lazy
    /// first group makes the captured domain start after the first `@`.
    static ref AUDIENCE_DOMAIN: Regex = Regex::new(r"^(.*?@)(.*[.].*)$").unwrap();
}

/// One domain registered to a Microsoft 365 tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainRecord {
    pub name: String,
}

/// Federation metadata document (`/metadata/json/1`), reduced to the
/// field this crate consumes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantMetadata {
    pub allowed_audiences: Vec<String>,
}

impl TenantMetadata {
    /// Domains embedded in the audience URIs, in document order.
    pub fn domains(&self) -> Vec<DomainRecord> {
        extract_domains(&self.allowed_audiences)
    }
}

/// Extracts the domain after `@` from every matching audience URI.
///
/// Non-matching audiences contribute nothing; duplicates are kept.
pub fn extract_domains<S: AsRef<str>>(audiences: &[S]) -> Vec<DomainRecord> {
    audiences
        .iter()
        .filter_map(|audience| {
            AUDIENCE_DOMAIN
                .captures(audience.as_ref())
                .and_then(|caps| caps.get(2))
                .map(|m| DomainRecord {
                    name: m.as_str().to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(records: &[DomainRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_extracts_domains_from_audiences() {
        let metadata: TenantMetadata = serde_json::from_value(json!({
            "allowedAudiences": [
                "00000001-0000-0000-c000-000000000000/accounts.accesscontrol.windows.net@contoso.com",
                "00000001-0000-0000-c000-000000000000/accounts.accesscontrol.windows.net@contoso.onmicrosoft.com",
                "00000001-0000-0000-c000-000000000000/accounts.accesscontrol.windows.net@8d4b1c2e-0000-0000-0000-000000000000"
            ],
            "issuer": "00000001-0000-0000-c000-000000000000@8d4b1c2e-0000-0000-0000-000000000000"
        }))
        .unwrap();

        assert_eq!(
            names(&metadata.domains()),
            vec!["contoso.com", "contoso.onmicrosoft.com"]
        );
    }

    #[test]
    fn test_no_audiences() {
        let metadata: TenantMetadata = serde_json::from_value(json!({})).unwrap();
        assert!(metadata.domains().is_empty());

        let empty: Vec<String> = Vec::new();
        assert!(extract_domains(&empty).is_empty());
    }

    #[test]
    fn test_non_matching_audiences_are_skipped() {
        let records = extract_domains(&["no-at-sign.example.com", "user@nodot", "", "@"]);
        assert!(records.is_empty());
    }

    #[test]
    fn test_domain_is_text_after_first_at() {
        let records = extract_domains(&["spn@first.com@second.org"]);
        assert_eq!(names(&records), vec!["first.com@second.org"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let records = extract_domains(&["a@contoso.com", "b@contoso.com"]);
        assert_eq!(names(&records), vec!["contoso.com", "contoso.com"]);
    }

    #[test]
    fn test_domain_record_serializes_as_name() {
        let record = DomainRecord {
            name: "contoso.com".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "Name": "contoso.com" })
        );
    }
}
