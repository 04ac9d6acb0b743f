//! Domain validation, namehash and DNS wire encoding.

use std::fmt;
use std::sync::LazyLock;

use alloy::primitives::{B256, Bytes, keccak256};
use regex::Regex;

/// Top-level domains served by Unstoppable Domains.
pub const UD_TLDS: &[&str] = &[
    "crypto",
    "x",
    "coin",
    "nft",
    "dao",
    "wallet",
    "blockchain",
    "bitcoin",
    "zil",
];

static ENS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[a-z0-9][a-z0-9-]*[a-z0-9]\.)+[a-z]{2,}$").expect("ENS pattern is valid")
});

static UD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^[a-z0-9-]+\.(?:{})$", UD_TLDS.join("|")))
        .expect("Unstoppable Domains pattern is valid")
});

/// Naming system a domain belongs to, decided by its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NamingSystem {
    /// Ethereum Name Service (`*.eth`).
    Ens,
    /// Unstoppable Domains (`*.crypto`, `*.x`, ...).
    UnstoppableDomains,
}

impl NamingSystem {
    /// Detects the naming system from the last label of `domain`.
    ///
    /// Matching is case-insensitive. Returns `None` for unknown suffixes.
    #[must_use]
    pub fn detect(domain: &str) -> Option<Self> {
        let tld = domain.rsplit_once('.').map_or(domain, |(_, tld)| tld);
        if tld.eq_ignore_ascii_case("eth") {
            Some(Self::Ens)
        } else if UD_TLDS.iter().any(|t| tld.eq_ignore_ascii_case(t)) {
            Some(Self::UnstoppableDomains)
        } else {
            None
        }
    }

    /// Returns `true` if `domain` (already lower-cased) satisfies this
    /// system's rules.
    #[must_use]
    pub fn validate(self, domain: &str) -> bool {
        match self {
            Self::Ens => domain.ends_with(".eth") && ENS_PATTERN.is_match(domain),
            Self::UnstoppableDomains => UD_PATTERN.is_match(domain),
        }
    }
}

impl fmt::Display for NamingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ens => f.write_str("ENS"),
            Self::UnstoppableDomains => f.write_str("Unstoppable Domains"),
        }
    }
}

/// Error validating or encoding a domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// The input was empty.
    #[error("domain is empty")]
    Empty,

    /// No supported naming system owns the suffix.
    #[error("unsupported domain suffix: {0}")]
    UnknownSuffix(String),

    /// The domain breaks its naming system's rules.
    #[error("{domain} is not a valid {system} domain")]
    Invalid {
        /// The rejected domain.
        domain: String,
        /// System whose rules were applied.
        system: NamingSystem,
    },

    /// A label does not fit in a DNS length byte.
    #[error("label longer than 255 bytes in {0}")]
    LabelTooLong(String),
}

/// A validated, lower-cased domain.
///
/// ```rust
/// use chainname::names::{Domain, NamingSystem};
///
/// let domain = Domain::parse("Brave.ETH").unwrap();
/// assert_eq!(domain.as_str(), "brave.eth");
/// assert_eq!(domain.system(), NamingSystem::Ens);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain {
    name: String,
    system: NamingSystem,
}

impl Domain {
    /// Normalizes and validates `input`.
    ///
    /// # Errors
    ///
    /// [`NameError::Empty`] for empty input, [`NameError::UnknownSuffix`] when
    /// no naming system owns the suffix and [`NameError::Invalid`] when the
    /// owning system's rules reject it.
    pub fn parse(input: &str) -> Result<Self, NameError> {
        if input.is_empty() {
            return Err(NameError::Empty);
        }
        let name = input.to_ascii_lowercase();
        let system =
            NamingSystem::detect(&name).ok_or_else(|| NameError::UnknownSuffix(name.clone()))?;
        if !system.validate(&name) {
            return Err(NameError::Invalid {
                domain: name,
                system,
            });
        }
        Ok(Self { name, system })
    }

    /// The normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The owning naming system.
    #[must_use]
    pub const fn system(&self) -> NamingSystem {
        self.system
    }

    /// The namehash of this domain.
    #[must_use]
    pub fn namehash(&self) -> B256 {
        namehash(&self.name)
    }

    /// The DNS wire encoding of this domain.
    ///
    /// # Errors
    ///
    /// Returns [`NameError::LabelTooLong`] if a label exceeds 255 bytes.
    pub fn dns_encode(&self) -> Result<Bytes, NameError> {
        dns_encode(&self.name)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Computes the namehash of `name` (EIP-137).
///
/// The empty name hashes to 32 zero bytes.
#[must_use]
pub fn namehash(name: &str) -> B256 {
    let mut node = B256::ZERO;
    if name.is_empty() {
        return node;
    }
    let mut buf = [0u8; 64];
    for label in name.rsplit('.') {
        buf[..32].copy_from_slice(node.as_slice());
        buf[32..].copy_from_slice(keccak256(label.as_bytes()).as_slice());
        node = keccak256(buf);
    }
    node
}

/// Encodes `name` in DNS wire format: length-prefixed labels followed by a
/// zero-length root label.
///
/// # Errors
///
/// Returns [`NameError::LabelTooLong`] if a label exceeds 255 bytes.
pub fn dns_encode(name: &str) -> Result<Bytes, NameError> {
    let mut out = Vec::with_capacity(name.len() + 2);
    if !name.is_empty() {
        for label in name.split('.') {
            let len =
                u8::try_from(label.len()).map_err(|_| NameError::LabelTooLong(name.to_owned()))?;
            out.push(len);
            out.extend_from_slice(label.as_bytes());
        }
    }
    out.push(0);
    Ok(out.into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alloy::primitives::{b256, hex};

    use super::*;

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
        assert_eq!(
            namehash("brantly-test.eth"),
            b256!("f3faf1d9f1ac025d689257244fad993ff01a33f42c5efc2d45e09bd9e81a94e8")
        );
    }

    #[test]
    fn test_dns_encode() {
        assert_eq!(
            hex::encode(dns_encode("offchainexample.eth").unwrap()),
            "0f6f6666636861696e6578616d706c650365746800"
        );
        assert_eq!(dns_encode("").unwrap().as_ref(), &[0]);

        let long = format!("{}.eth", "a".repeat(256));
        assert!(matches!(dns_encode(&long), Err(NameError::LabelTooLong(_))));
    }

    #[test]
    fn test_ens_rules() {
        for valid in ["brave.eth", "test.brave.eth", "brave-test.test-dev.eth", "BRAVE.eth"] {
            let domain = Domain::parse(valid).unwrap();
            assert_eq!(domain.system(), NamingSystem::Ens, "{valid}");
        }
        for invalid in [
            ".eth",
            "-brave.eth",
            "brave-.eth",
            "b.eth",
            "-brave.test.eth",
            "brave-.test.eth",
            "brave..eth",
            "eth",
        ] {
            assert!(
                matches!(Domain::parse(invalid), Err(NameError::Invalid { .. })),
                "{invalid}"
            );
        }
        for unknown in ["brave.e-th", "brave.e", "brave.com"] {
            assert!(
                matches!(Domain::parse(unknown), Err(NameError::UnknownSuffix(_))),
                "{unknown}"
            );
        }
    }

    #[test]
    fn test_unstoppable_rules() {
        for valid in ["a.crypto", "1.crypto", "-.crypto", "brave.zil", "brad.x"] {
            let domain = Domain::parse(valid).unwrap();
            assert_eq!(domain.system(), NamingSystem::UnstoppableDomains, "{valid}");
        }
        for invalid in [
            ".",
            "crypto.",
            "crypto.1",
            ".crypto",
            "crypto.brave",
            "brave.crypto-",
            "brave.test.crypto",
            "test.888",
        ] {
            assert!(Domain::parse(invalid).is_err(), "{invalid}");
        }
        assert!(matches!(
            Domain::parse("brave.test.crypto"),
            Err(NameError::Invalid { system: NamingSystem::UnstoppableDomains, .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Domain::parse(""), Err(NameError::Empty));
    }
}
