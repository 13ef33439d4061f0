//! Trust decisions: is the envelope's `jku` listed by a registry?

use trusted_jws_core::JoseHeader;
use trusted_jws_registry::ResolvedRegistry;

/// Outcome of matching an envelope's `jku` against the resolved registries.
///
/// Only [`TrustDecision::Trusted`] licenses dereferencing the `jku`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustDecision {
    /// The `jku` is listed by `registry`.
    Trusted {
        /// The listed key-set URL.
        jku: String,
        /// URI of the first registry listing it.
        registry: String,
    },
    /// No available registry lists the `jku`, or there is none.
    Untrusted,
}

impl TrustDecision {
    /// Returns true for [`TrustDecision::Trusted`].
    #[must_use]
    pub const fn is_trusted(&self) -> bool {
        matches!(self, Self::Trusted { .. })
    }

    /// Returns the trusted `jku`, if any.
    #[must_use]
    pub fn trusted_jku(&self) -> Option<&str> {
        match self {
            Self::Trusted { jku, .. } => Some(jku),
            Self::Untrusted => None,
        }
    }

    /// Returns the registry that vouched for the `jku`, if any.
    #[must_use]
    pub fn registry(&self) -> Option<&str> {
        match self {
            Self::Trusted { registry, .. } => Some(registry),
            Self::Untrusted => None,
        }
    }
}

/// Decides trust from a header and the registries resolved for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustResolver;

impl TrustResolver {
    /// Returns [`TrustDecision::Trusted`] when an available registry lists
    /// the header's `jku` exactly; registries are consulted in order and
    /// failed ones are skipped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use trusted_jws_core::JoseHeader;
    /// use trusted_jws_registry::{RegistryBody, RegistryEntry, ResolvedRegistry};
    /// use trusted_jws_verifier::{TrustDecision, TrustResolver};
    ///
    /// let entry = RegistryEntry::new(
    ///     "https://x/list.json",
    ///     chrono::Utc::now(),
    ///     RegistryBody::Members(vec!["https://x/trusted".to_string()]),
    /// );
    /// let registries = [ResolvedRegistry::Available(Arc::new(entry))];
    ///
    /// let header = JoseHeader::new("RS256").with_jku("https://x/trusted");
    /// assert!(TrustResolver::decide(Some(&header), &registries).is_trusted());
    ///
    /// let header = JoseHeader::new("RS256").with_jku("https://x/untrusted");
    /// assert_eq!(TrustResolver::decide(Some(&header), &registries), TrustDecision::Untrusted);
    /// ```
    #[must_use]
    pub fn decide(header: Option<&JoseHeader>, registries: &[ResolvedRegistry]) -> TrustDecision {
        let Some(jku) = header.and_then(JoseHeader::jku) else {
            tracing::debug!("No jku in header; untrusted");
            return TrustDecision::Untrusted;
        };

        let listing = registries
            .iter()
            .filter_map(ResolvedRegistry::entry)
            .find(|entry| entry.contains(jku));

        match listing {
            Some(entry) => {
                tracing::debug!(jku, registry = entry.uri(), "jku is listed; trusted");
                TrustDecision::Trusted {
                    jku: jku.to_string(),
                    registry: entry.uri().to_string(),
                }
            }
            None => {
                tracing::debug!(jku, registries = registries.len(), "jku is not listed; untrusted");
                TrustDecision::Untrusted
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use trusted_jws_registry::{FetchError, RegistryBody, RegistryEntry, RegistryFetchWarning};

    fn available(uri: &str, members: &[&str]) -> ResolvedRegistry {
        ResolvedRegistry::Available(Arc::new(RegistryEntry::new(
            uri,
            Utc::now(),
            RegistryBody::Members(members.iter().map(|m| (*m).to_string()).collect()),
        )))
    }

    fn failed(uri: &str) -> ResolvedRegistry {
        ResolvedRegistry::Failed(RegistryFetchWarning {
            uri: uri.to_string(),
            error: FetchError::Timeout {
                url: uri.to_string(),
                timeout: Duration::from_millis(1000),
            },
        })
    }

    fn header(jku: &str) -> JoseHeader {
        JoseHeader::new("RS256").with_jku(jku)
    }

    #[test]
    fn test_no_header_is_untrusted() {
        let registries = [available("https://r", &["https://x/trusted"])];
        assert_eq!(TrustResolver::decide(None, &registries), TrustDecision::Untrusted);
    }

    #[test]
    fn test_no_jku_is_untrusted() {
        let registries = [available("https://r", &["https://x/trusted"])];
        let header = JoseHeader::new("RS256");
        assert_eq!(
            TrustResolver::decide(Some(&header), &registries),
            TrustDecision::Untrusted
        );
    }

    #[test]
    fn test_listed_jku_is_trusted() {
        let registries = [available("https://r", &["https://x/trusted"])];
        let decision = TrustResolver::decide(Some(&header("https://x/trusted")), &registries);
        assert_eq!(
            decision,
            TrustDecision::Trusted {
                jku: "https://x/trusted".to_string(),
                registry: "https://r".to_string(),
            }
        );
        assert_eq!(decision.trusted_jku(), Some("https://x/trusted"));
        assert_eq!(decision.registry(), Some("https://r"));
    }

    #[test]
    fn test_match_is_exact() {
        let registries = [available("https://r", &["https://x/trusted"])];
        for jku in ["https://x/trusted/", "HTTPS://x/trusted", "https://x/trust"] {
            assert!(!TrustResolver::decide(Some(&header(jku)), &registries).is_trusted());
        }
    }

    #[test]
    fn test_failed_registry_does_not_hide_others() {
        let registries = [failed("https://a"), available("https://b", &["https://x/trusted"])];
        let decision = TrustResolver::decide(Some(&header("https://x/trusted")), &registries);
        assert_eq!(decision.registry(), Some("https://b"));
    }

    #[test]
    fn test_first_listing_registry_wins() {
        let registries = [
            available("https://a", &["https://x/other"]),
            available("https://b", &["https://x/trusted"]),
            available("https://c", &["https://x/trusted"]),
        ];
        let decision = TrustResolver::decide(Some(&header("https://x/trusted")), &registries);
        assert_eq!(decision.registry(), Some("https://b"));
    }

    #[test]
    fn test_unavailable_entry_lists_nothing() {
        let entry = RegistryEntry::new(
            "https://a",
            Utc::now(),
            RegistryBody::Unavailable {
                ttl: Duration::from_secs(60),
            },
        );
        let registries = [ResolvedRegistry::Available(Arc::new(entry))];
        let listed = header("https://x/trusted");
        assert!(!TrustResolver::decide(Some(&listed), &registries).is_trusted());
    }

    #[test]
    fn test_all_failed_is_untrusted() {
        let registries = [failed("https://a"), failed("https://b")];
        let listed = header("https://x/trusted");
        assert!(!TrustResolver::decide(Some(&listed), &registries).is_trusted());
    }
}
