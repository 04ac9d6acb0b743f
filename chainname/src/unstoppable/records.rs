//! DNS-style records stored on a ProxyReader and the URL they point at.

use url::Url;

/// Record keys requested with `getMany`, in request order.
pub const DNS_RECORD_KEYS: [&str; 6] = [
    "dweb.ipfs.hash",
    "ipfs.html.value",
    "dweb.swarm.hash",
    "dweb.bzz.hash",
    "ipfs.redirect_domain.value",
    "browser.redirect_url",
];

/// Record key holding the Ethereum address.
pub const ETH_ADDRESS_KEY: &str = "crypto.ETH.address";

/// Values returned for [`DNS_RECORD_KEYS`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsRecordSet {
    /// `dweb.ipfs.hash`
    pub ipfs_hash: String,
    /// `ipfs.html.value`, the legacy IPFS hash key.
    pub ipfs_html: String,
    /// `dweb.swarm.hash`
    pub swarm_hash: String,
    /// `dweb.bzz.hash`
    pub bzz_hash: String,
    /// `ipfs.redirect_domain.value`
    pub redirect_domain: String,
    /// `browser.redirect_url`
    pub redirect_url: String,
}

impl DnsRecordSet {
    /// Builds the set from `getMany` values in [`DNS_RECORD_KEYS`] order.
    ///
    /// Returns `None` when the number of values does not match the keys.
    #[must_use]
    pub fn from_values(values: Vec<String>) -> Option<Self> {
        let [
            ipfs_hash,
            ipfs_html,
            swarm_hash,
            bzz_hash,
            redirect_domain,
            redirect_url,
        ]: [String; 6] = values.try_into().ok()?;
        Some(Self {
            ipfs_hash,
            ipfs_html,
            swarm_hash,
            bzz_hash,
            redirect_domain,
            redirect_url,
        })
    }

    /// Whether every value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.ipfs_hash,
            &self.ipfs_html,
            &self.swarm_hash,
            &self.bzz_hash,
            &self.redirect_domain,
            &self.redirect_url,
        ]
        .iter()
        .all(|v| v.is_empty())
    }

    /// The URL the records point at.
    ///
    /// An IPFS hash wins (`dweb.ipfs.hash` before `ipfs.html.value`) and
    /// becomes `ipfs://<hash>`; otherwise `browser.redirect_url`, then
    /// `ipfs.redirect_domain.value`. The first non-empty candidate decides:
    /// if it is not a valid URL there is no URL at all.
    ///
    /// ```rust
    /// use chainname::unstoppable::DnsRecordSet;
    ///
    /// let records = DnsRecordSet {
    ///     redirect_url: "https://brave.com".to_owned(),
    ///     ..DnsRecordSet::default()
    /// };
    /// assert_eq!(records.to_url().unwrap().as_str(), "https://brave.com/");
    /// ```
    #[must_use]
    pub fn to_url(&self) -> Option<Url> {
        let candidate = [&self.ipfs_hash, &self.ipfs_html]
            .into_iter()
            .find(|hash| !hash.is_empty())
            .map(|hash| format!("ipfs://{hash}"))
            .or_else(|| {
                [&self.redirect_url, &self.redirect_domain]
                    .into_iter()
                    .find(|v| !v.is_empty())
                    .cloned()
            })?;
        Url::parse(&candidate).ok()
    }
}
