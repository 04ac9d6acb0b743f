//! Chains the resolvers read from.

use std::fmt;

/// An EVM-compatible chain addressed by numeric chain ID.
///
/// # Examples
///
/// ```rust
/// use chainname::Chain;
///
/// let chain = Chain::from_id(137);
/// assert_eq!(chain, Chain::Polygon);
/// assert_eq!(chain.name(), "polygon");
/// assert_eq!(Chain::from_id(999).name(), "evm-999");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Chain {
    /// Ethereum Mainnet (chain ID: 1).
    Ethereum,
    /// Polygon `PoS` (chain ID: 137).
    Polygon,
    /// Sepolia Testnet (chain ID: 11155111).
    Sepolia,
    /// Any other chain.
    Custom {
        /// Numeric chain ID.
        id: u64,
    },
}

impl Chain {
    /// Get the numeric chain ID.
    #[must_use]
    pub const fn id(self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::Polygon => 137,
            Self::Sepolia => 11_155_111,
            Self::Custom { id } => id,
        }
    }

    /// Get the human-readable chain name.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Ethereum => "ethereum".to_owned(),
            Self::Polygon => "polygon".to_owned(),
            Self::Sepolia => "sepolia".to_owned(),
            Self::Custom { id } => format!("evm-{id}"),
        }
    }

    /// Infer a [`Chain`] from a numeric chain ID.
    #[must_use]
    pub const fn from_id(id: u64) -> Self {
        match id {
            1 => Self::Ethereum,
            137 => Self::Polygon,
            11_155_111 => Self::Sepolia,
            _ => Self::Custom { id },
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}
