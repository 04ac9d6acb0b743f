//! Unstoppable Domains resolution across Polygon and Ethereum.

mod common;

use alloy::sol_types::{SolCall, SolValue};
use chainname::contracts::{UD_PROXY_READER_ETHEREUM, UD_PROXY_READER_POLYGON, sol};
use chainname::prelude::*;
use chainname::transport::mock::EthCallReply;
use common::{ETH_RPC, MockNetwork, POLYGON_RPC, string_array_word, string_word};

// Ethereum: brad.crypto
const BRAD_ADDR: &str = "0x8aaD44321A86b170879d7A244c1e8d360c99DdA8";
// Polygon: javajobs.crypto
const JAVAJOBS_ADDR: &str = "0x3a2f3f7aab82d69036763cfd3f755975f84496e6";

fn value(s: &str) -> EthCallReply {
    EthCallReply::Return(string_word(s))
}

fn timeout() -> EthCallReply {
    EthCallReply::Status(408)
}

fn dns(values: [&str; 6]) -> EthCallReply {
    EthCallReply::Return(string_array_word(values))
}

fn dns_ipfs() -> EthCallReply {
    dns(["ipfs_hash", "", "", "", "", "https://brave.com"])
}

fn dns_brave() -> EthCallReply {
    dns(["", "", "", "", "", "https://brave.com"])
}

fn dns_empty() -> EthCallReply {
    dns(["", "", "", "", "", ""])
}

async fn ud_address(
    eth: EthCallReply,
    polygon: EthCallReply,
    domain: &str,
) -> Result<Outcome<String>> {
    let network = MockNetwork::new();
    network.ud_get(ETH_RPC, UD_PROXY_READER_ETHEREUM, eth);
    network.ud_get(POLYGON_RPC, UD_PROXY_READER_POLYGON, polygon);
    network
        .service(ConsentState::Ask)
        .resolve_address(domain, None)
        .await
}

async fn web_url(eth: EthCallReply, polygon: EthCallReply) -> Result<Outcome<String>> {
    let network = MockNetwork::new();
    network.ud_get_many(ETH_RPC, UD_PROXY_READER_ETHEREUM, eth);
    network.ud_get_many(POLYGON_RPC, UD_PROXY_READER_POLYGON, polygon);
    network
        .service(ConsentState::Ask)
        .resolve_dns("brave.crypto", None)
        .await
        .map(|outcome| outcome.map(String::from))
}

fn kind<T: std::fmt::Debug>(result: Result<T>) -> ProviderError {
    result.unwrap_err().kind()
}

mod address {
    use super::*;

    #[tokio::test]
    async fn polygon_errors_win() {
        assert_eq!(
            kind(ud_address(timeout(), timeout(), "brad.crypto").await),
            ProviderError::InternalError
        );
        assert_eq!(
            kind(ud_address(value(BRAD_ADDR), timeout(), "brad.crypto").await),
            ProviderError::InternalError
        );
        assert_eq!(
            kind(
                ud_address(
                    value(BRAD_ADDR),
                    EthCallReply::Raw("Not a json".to_owned()),
                    "brad.crypto"
                )
                .await
            ),
            ProviderError::ParsingError
        );

        let limited = ud_address(
            value(BRAD_ADDR),
            EthCallReply::Error {
                code: -32005,
                message: "Error!".to_owned(),
            },
            "brad.crypto",
        )
        .await
        .unwrap_err();
        assert_eq!(limited.kind(), ProviderError::LimitExceeded);
        assert_eq!(limited.message(), "Error!");
    }

    #[tokio::test]
    async fn polygon_value_wins() {
        let expected = Outcome::Value(JAVAJOBS_ADDR.to_owned());
        for eth in [timeout(), value(BRAD_ADDR), value("")] {
            assert_eq!(
                ud_address(eth, value(JAVAJOBS_ADDR), "javajobs.crypto")
                    .await
                    .expect("resolves"),
                expected
            );
        }
    }

    #[tokio::test]
    async fn empty_polygon_falls_back_to_ethereum() {
        let outcome = ud_address(value(BRAD_ADDR), value(""), "brad.crypto")
            .await
            .expect("resolves");
        // returned as stored, not re-checksummed
        assert_eq!(outcome, Outcome::Value(BRAD_ADDR.to_owned()));

        assert_eq!(
            kind(ud_address(timeout(), value(""), "brad.crypto").await),
            ProviderError::InternalError
        );
        assert_eq!(
            ud_address(value(""), value(""), "brad.crypto")
                .await
                .expect("resolves"),
            Outcome::NoRecord
        );
    }

    #[tokio::test]
    async fn invalid_domain_makes_no_requests() {
        let network = MockNetwork::new();
        let service = network.service(ConsentState::Ask);
        for name in ["brad.test", "brave.test.crypto", "crypto.brave", ".crypto"] {
            let err = service.resolve_address(name, None).await.unwrap_err();
            assert_eq!(err.kind(), ProviderError::InvalidDomain, "{name}");
        }
        assert_eq!(network.mock.request_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_calls_share_requests() {
        let network = MockNetwork::new();
        network.ud_get_by_domain(
            ETH_RPC,
            UD_PROXY_READER_ETHEREUM,
            &[("javajobs.crypto", BRAD_ADDR), ("another.crypto", BRAD_ADDR)],
        );
        network.ud_get_by_domain(
            POLYGON_RPC,
            UD_PROXY_READER_POLYGON,
            &[("javajobs.crypto", JAVAJOBS_ADDR)],
        );
        let service = network.service(ConsentState::Ask);

        let (first, second, third) = tokio::join!(
            service.resolve_address("javajobs.crypto", None),
            service.resolve_address("javajobs.crypto", None),
            service.resolve_address("another.crypto", None),
        );
        assert_eq!(first.expect("resolves"), Outcome::Value(JAVAJOBS_ADDR.to_owned()));
        assert_eq!(second.expect("resolves"), Outcome::Value(JAVAJOBS_ADDR.to_owned()));
        assert_eq!(third.expect("resolves"), Outcome::Value(BRAD_ADDR.to_owned()));
        assert_eq!(network.mock.request_count(), 4);
        assert_eq!(network.requests_to(ETH_RPC), 2);
        assert_eq!(network.requests_to(POLYGON_RPC), 2);
    }
}

mod dns {
    use super::*;

    #[tokio::test]
    async fn polygon_errors_win() {
        assert_eq!(
            kind(web_url(timeout(), timeout()).await),
            ProviderError::InternalError
        );
        assert_eq!(
            kind(web_url(dns_brave(), timeout()).await),
            ProviderError::InternalError
        );
        assert_eq!(
            kind(web_url(dns_brave(), EthCallReply::Raw("Not a json".to_owned())).await),
            ProviderError::ParsingError
        );
        let limited = web_url(
            dns_brave(),
            EthCallReply::Error {
                code: -32005,
                message: "Error!".to_owned(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(limited.kind(), ProviderError::LimitExceeded);
        assert_eq!(limited.message(), "Error!");
    }

    #[tokio::test]
    async fn polygon_records_win() {
        for eth in [timeout(), dns_ipfs(), dns_empty()] {
            assert_eq!(
                web_url(eth, dns_brave()).await.expect("resolves"),
                Outcome::Value("https://brave.com/".to_owned())
            );
        }
    }

    #[tokio::test]
    async fn fallback_to_ethereum() {
        assert_eq!(
            web_url(dns_ipfs(), dns_empty()).await.expect("resolves"),
            Outcome::Value("ipfs://ipfs_hash".to_owned())
        );
        assert_eq!(
            web_url(dns_brave(), dns(["", "", "", "", "", "invalid url"]))
                .await
                .expect("resolves"),
            Outcome::Value("https://brave.com/".to_owned())
        );
    }

    #[tokio::test]
    async fn fallback_errors_and_empty() {
        assert_eq!(
            kind(web_url(timeout(), dns_empty()).await),
            ProviderError::InternalError
        );
        assert_eq!(
            web_url(dns(["", "", "", "", "", "invalid url"]), dns_empty())
                .await
                .expect("resolves"),
            Outcome::NoRecord
        );
    }

    #[tokio::test]
    async fn wrong_number_of_values_is_parsing_error() {
        let short = EthCallReply::Return(vec!["ipfs_hash".to_owned()].abi_encode());
        assert_eq!(
            kind(web_url(dns_empty(), short).await),
            ProviderError::ParsingError
        );
    }

    #[tokio::test]
    async fn concurrent_calls_share_requests() {
        let network = MockNetwork::new();
        network.ud_get_many(ETH_RPC, UD_PROXY_READER_ETHEREUM, dns_ipfs());
        network.ud_get_many(POLYGON_RPC, UD_PROXY_READER_POLYGON, dns_brave());
        let service = network.service(ConsentState::Ask);

        let (first, second) = tokio::join!(
            service.resolve_dns("brave.crypto", None),
            service.resolve_dns("brave.crypto", None),
        );
        assert_eq!(first, second);
        assert_eq!(
            first.expect("resolves").map(String::from),
            Outcome::Value("https://brave.com/".to_owned())
        );
        assert_eq!(network.mock.request_count(), 2);
    }

    #[tokio::test]
    async fn requests_carry_record_keys() {
        let network = MockNetwork::new();
        network.ud_get_many(ETH_RPC, UD_PROXY_READER_ETHEREUM, dns_empty());
        network.ud_get_many(POLYGON_RPC, UD_PROXY_READER_POLYGON, dns_empty());
        let service = network.service(ConsentState::Ask);
        service.resolve_dns("brave.x", None).await.expect("resolves");

        let (_, data) = network.mock.requests()[0].eth_call().expect("eth_call");
        let call = sol::IProxyReader::getManyCall::abi_decode(&data).expect("getMany arguments");
        assert_eq!(
            call.keys,
            chainname::unstoppable::DNS_RECORD_KEYS.map(str::to_owned).to_vec()
        );
        assert_eq!(
            call.tokenId.to_be_bytes::<32>(),
            chainname::names::namehash("brave.x").0
        );
    }
}
