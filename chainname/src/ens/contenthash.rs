//! EIP-1577 content hash to URL conversion.
//!
//! A content hash is `varint(namespace) ++ CID`. IPFS (`0xe3`) and IPNS
//! (`0xe5`) hashes are rendered as `ipfs://<cid>` / `ipns://<cid>` with the
//! CID in its CIDv1 base32 form. Anything else has no URL.

use url::Url;

const IPFS_NS: u64 = 0xe3;
const IPNS_NS: u64 = 0xe5;

const CID_V1: u8 = 0x01;
const DAG_PB: u8 = 0x70;
/// sha2-256 multihash prefix of a CIDv0.
const CID_V0_PREFIX: [u8; 2] = [0x12, 0x20];

const BASE32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Converts an EIP-1577 content hash into a URL.
///
/// Returns `None` for empty input, unknown namespaces and malformed CIDs.
///
/// ```rust
/// use alloy::primitives::hex;
/// use chainname::ens::contenthash_to_url;
///
/// let hash = hex::decode(
///     "e3010170122023e0160eec32d7875c19c5ac7c03bc1f306dc260080d621454bc5f631e7310a7",
/// )
/// .unwrap();
/// assert_eq!(
///     contenthash_to_url(&hash).unwrap().as_str(),
///     "ipfs://bafybeibd4ala53bs26dvygofvr6ahpa7gbw4eyaibvrbivf4l5rr44yqu4",
/// );
/// ```
#[must_use]
pub fn contenthash_to_url(contenthash: &[u8]) -> Option<Url> {
    let (namespace, cid) = read_varint(contenthash)?;
    let scheme = match namespace {
        IPFS_NS => "ipfs",
        IPNS_NS => "ipns",
        _ => return None,
    };

    let cid = normalize_cid(cid)?;
    Url::parse(&format!("{scheme}://b{}", base32_lower(&cid))).ok()
}

/// Returns the CIDv1 bytes of `cid`, upgrading a bare CIDv0 multihash.
fn normalize_cid(cid: &[u8]) -> Option<Vec<u8>> {
    if cid.starts_with(&CID_V0_PREFIX) && cid.len() == 34 {
        let mut v1 = vec![CID_V1, DAG_PB];
        v1.extend_from_slice(cid);
        return Some(v1);
    }
    let (version, rest) = read_varint(cid)?;
    if version != u64::from(CID_V1) {
        return None;
    }
    let (_codec, multihash) = read_varint(rest)?;
    let (_hash_fn, digest) = read_varint(multihash)?;
    let (digest_len, digest) = read_varint(digest)?;
    if usize::try_from(digest_len).ok()? != digest.len() || digest.is_empty() {
        return None;
    }
    Some(cid.to_vec())
}

/// Reads an unsigned LEB128 varint of at most 9 bytes.
fn read_varint(data: &[u8]) -> Option<(u64, &[u8])> {
    let mut value = 0u64;
    for (i, byte) in data.iter().take(9).enumerate() {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Some((value, &data[i + 1..]));
        }
    }
    None
}

/// RFC 4648 base32, lower-case, unpadded.
fn base32_lower(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut buffer: u16 = 0;
    let mut bits = 0u8;
    for &byte in data {
        buffer = (buffer << 8) | u16::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(char::from(BASE32_ALPHABET[usize::from((buffer >> bits) & 0x1f)]));
        }
        buffer &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(char::from(BASE32_ALPHABET[usize::from((buffer << (5 - bits)) & 0x1f)]));
    }
    out
}

#[cfg(test)]
mod tests {
    use alloy::primitives::hex;

    use super::*;

    fn url_for(hash: &str) -> Option<String> {
        contenthash_to_url(&hex::decode(hash).expect("hex")).map(String::from)
    }

    #[test]
    fn ipfs_hashes() {
        assert_eq!(
            url_for("e3010170122023e0160eec32d7875c19c5ac7c03bc1f306dc260080d621454bc5f631e7310a7")
                .as_deref(),
            Some("ipfs://bafybeibd4ala53bs26dvygofvr6ahpa7gbw4eyaibvrbivf4l5rr44yqu4")
        );
        assert_eq!(
            url_for("e30101701220f073be187e8e06039796c432a5bdd6da3f403c2f93fa5d9dbdc5547c7fe0e3bc")
                .as_deref(),
            Some("ipfs://bafybeihqoo7bq7uoaybzpfwegks33vw2h5adyl4t7joz3pofkr6h7yhdxq")
        );
    }

    #[test]
    fn ipns_uses_its_own_scheme() {
        let url = url_for(
            "e50101701220f073be187e8e06039796c432a5bdd6da3f403c2f93fa5d9dbdc5547c7fe0e3bc",
        )
        .expect("ipns url");
        assert!(url.starts_with("ipns://bafybei"), "{url}");
    }

    #[test]
    fn cid_v0_is_upgraded() {
        let v0 =
            url_for("e3011220f073be187e8e06039796c432a5bdd6da3f403c2f93fa5d9dbdc5547c7fe0e3bc");
        assert_eq!(
            v0.as_deref(),
            Some("ipfs://bafybeihqoo7bq7uoaybzpfwegks33vw2h5adyl4t7joz3pofkr6h7yhdxq")
        );
    }

    #[test]
    fn unsupported_or_malformed() {
        assert_eq!(url_for(""), None);
        // swarm namespace
        let swarm = concat!(
            "e40101fa011b20",
            "d1de9994b4d039f6548d191eb26786769f580809256b4685ef316805265ea162",
        );
        assert_eq!(url_for(swarm), None);
        // truncated digest
        assert_eq!(url_for("e3010170122023e016"), None);
    }

    #[test]
    fn base32_reference_vectors() {
        assert_eq!(base32_lower(b""), "");
        assert_eq!(base32_lower(b"f"), "my");
        assert_eq!(base32_lower(b"fo"), "mzxq");
        assert_eq!(base32_lower(b"foobar"), "mzxw6ytboi");
    }
}
