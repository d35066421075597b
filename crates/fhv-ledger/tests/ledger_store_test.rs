//! Contract tests for the ledger client and record store against a mock node.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST   | `/v1/view` | `list_*`, `find_by_name_*`, `total_*`, `view_*` |
//! | GET    | `/v1/transactions/by_hash/{hash}` | `store_*`, `verify_*` |
//! | GET    | `/account` (bridge) | `bridge_*`, `*_bridge_*` |
//! | POST   | `/sign_and_submit` (bridge) | `store_*`, `bridge_*` |

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fhv_core::{sha256_digest, Author, FailureKind, RecordName};
use fhv_ledger::{
    EntryFunctionPayload, LedgerClient, LedgerConfig, LedgerError, LedgerRecordStore,
    SigningSession, TransactionHandle, WalletBridgeSession,
};
use fhv_store::RecordStore;
use serde_json::json;
use wiremock::matchers::{any, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HELLO_HEX: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
const ADDRESS: &str = "0xcafe";

/// Session that hands out a fixed hash and counts submissions.
struct FixedSession {
    hash: String,
    submitted: AtomicU32,
}

impl FixedSession {
    fn new(hash: &str) -> Arc<Self> {
        Arc::new(Self {
            hash: hash.to_string(),
            submitted: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl SigningSession for FixedSession {
    fn account(&self) -> Author {
        Author::new("0xa11ce")
    }

    async fn sign_and_submit(
        &self,
        _payload: &EntryFunctionPayload,
    ) -> Result<TransactionHandle, LedgerError> {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionHandle::new(self.hash.clone()))
    }
}

fn node_config(server: &MockServer, address: &str) -> LedgerConfig {
    LedgerConfig::local_mock(&format!("{}/v1", server.uri()), address).unwrap()
}

fn store_for(server: &MockServer) -> LedgerRecordStore {
    LedgerRecordStore::new(LedgerClient::new(node_config(server, ADDRESS)).unwrap())
}

fn hello_record(count: &str) -> serde_json::Value {
    json!({
        "file_name": "greeting.txt",
        "file_hash": format!("0x{HELLO_HEX}"),
        "uploader": "0xa11ce",
        "timestamp": "1768478400",
        "verification_count": count
    })
}

fn name(s: &str) -> RecordName {
    RecordName::new(s).unwrap()
}

// ── Unconfigured contract ────────────────────────────────────────────

#[tokio::test]
async fn unset_address_fails_without_network_calls() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = node_config(&server, ADDRESS);
    config.module_address = None;
    let session = FixedSession::new("0x01");
    let store = LedgerRecordStore::new(LedgerClient::new(config).unwrap()).with_session(session.clone());

    let digest = sha256_digest(b"hello");
    let err = store
        .upsert_by_name(&name("greeting.txt"), &digest, &Author::placeholder())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::RemoteUnavailable);
    let err = store.find_by_digest(&digest).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::RemoteUnavailable);
    assert_eq!(session.submitted.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sentinel_address_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = LedgerRecordStore::new(LedgerClient::new(node_config(&server, "0x1")).unwrap());
    let err = store.list_all().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::RemoteUnavailable);
}

// ── POST /v1/view ────────────────────────────────────────────────────

#[tokio::test]
async fn list_decodes_contract_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/view"))
        .and(body_partial_json(json!({
            "function": "0xcafe::file_hash_verifier::get_all_files",
            "type_arguments": [],
            "arguments": []
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[hello_record("2")]])))
        .expect(2)
        .mount(&server)
        .await;

    let store = store_for(&server);
    let records = store.list_all().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].digest.to_hex(), HELLO_HEX);
    assert_eq!(records[0].verification_count, 2);

    let found = store.find_by_digest(&sha256_digest(b"hello")).await.unwrap().unwrap();
    assert_eq!(found.name, "greeting.txt");
}

#[tokio::test]
async fn list_keeps_foreign_names_and_skips_broken_records() {
    let server = MockServer::start().await;
    let long_name = "x".repeat(300);
    let foreign = json!({
        "file_name": long_name,
        "file_hash": format!("0x{HELLO_HEX}"),
        "uploader": "0xb0b",
        "timestamp": "1768478400",
        "verification_count": "0"
    });
    let broken = json!({
        "file_name": "broken.bin",
        "file_hash": "0x1234",
        "uploader": "0xb0b",
        "timestamp": "1768478400",
        "verification_count": "0"
    });
    Mock::given(method("POST"))
        .and(path("/v1/view"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([[foreign, broken, hello_record("1")]])),
        )
        .mount(&server)
        .await;

    let store = store_for(&server);
    let records = store.list_all().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name.as_str(), long_name);
    assert_eq!(records[1].name, "greeting.txt");

    let found = store.find_by_digest(&sha256_digest(b"hello")).await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn find_by_name_handles_option_shapes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/view"))
        .and(body_partial_json(json!({ "arguments": ["missing.txt"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "vec": [] }])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/view"))
        .and(body_partial_json(json!({ "arguments": ["greeting.txt"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "vec": [hello_record("0")] }])))
        .mount(&server)
        .await;

    let store = store_for(&server);
    assert!(store.find_by_name(&name("missing.txt")).await.unwrap().is_none());
    let rec = store.find_by_name(&name("greeting.txt")).await.unwrap().unwrap();
    assert_eq!(rec.author.as_str(), "0xa11ce");
}

#[tokio::test]
async fn total_accepts_decimal_string() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["7"])))
        .mount(&server)
        .await;

    assert_eq!(store_for(&server).total_records().await.unwrap(), 7);
}

#[tokio::test]
async fn view_module_not_found_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/view"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Module not found",
            "error_code": "module_not_found"
        })))
        .mount(&server)
        .await;

    let err = store_for(&server).list_all().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::RemoteUnavailable);
}

#[tokio::test]
async fn view_server_error_is_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/view"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream busy"))
        .expect(1)
        .mount(&server)
        .await;

    let err = store_for(&server).list_all().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Network);
}

// ── Writes ───────────────────────────────────────────────────────────

#[tokio::test]
async fn store_waits_for_confirmation_then_reads_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/transactions/by_hash/0xabc"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/transactions/by_hash/0xabc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "user_transaction",
            "hash": "0xabc",
            "success": true,
            "vm_status": "Executed successfully"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/view"))
        .and(body_partial_json(json!({
            "function": "0xcafe::file_hash_verifier::get_file_by_name"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([hello_record("0")])))
        .expect(1)
        .mount(&server)
        .await;

    let session = FixedSession::new("0xabc");
    let store = store_for(&server).with_session(session.clone());
    let rec = store
        .upsert_by_name(&name("greeting.txt"), &sha256_digest(b"hello"), &Author::placeholder())
        .await
        .unwrap();

    assert_eq!(rec.name, "greeting.txt");
    assert_eq!(rec.digest.to_hex(), HELLO_HEX);
    assert_eq!(session.submitted.load(Ordering::SeqCst), 1);
    assert_eq!(store.last_transaction().as_deref(), Some("0xabc"));
}

#[tokio::test]
async fn verify_failed_transaction_is_rejected_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/transactions/by_hash/0xdead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "user_transaction",
            "success": false,
            "vm_status": "Move abort in 0xcafe::file_hash_verifier: E_HASH_MISMATCH(0x2)"
        })))
        .mount(&server)
        .await;

    let store = store_for(&server).with_session(FixedSession::new("0xdead"));
    let record = fhv_core::FileRecord::new(
        name("greeting.txt"),
        sha256_digest(b"hello"),
        Author::new("0xa11ce"),
        fhv_core::Timestamp::now(),
    );
    let err = store.record_verification(&record).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::RemoteRejected);
    assert!(err.to_string().contains("E_HASH_MISMATCH"));
    assert!(store.last_transaction().is_none());
}

#[tokio::test]
async fn write_without_session_is_authorization_missing() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = store_for(&server)
        .upsert_by_name(&name("a.txt"), &sha256_digest(b"a"), &Author::placeholder())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::AuthorizationMissing);
}

#[tokio::test]
async fn clear_is_unsupported_on_ledger() {
    let server = MockServer::start().await;
    let err = store_for(&server).clear_all().await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::InvalidInput);
}

// ── Wallet bridge ────────────────────────────────────────────────────

#[tokio::test]
async fn bridge_connects_and_submits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .and(header("authorization", "Bearer bridge-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "address": "0xa11ce" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sign_and_submit"))
        .and(body_partial_json(json!({
            "sender": "0xa11ce",
            "payload": {
                "type": "entry_function_payload",
                "function": "0xcafe::file_hash_verifier::store_file_hash"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "hash": "0xbeef" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = WalletBridgeSession::connect(
        reqwest::Client::new(),
        server.uri().parse().unwrap(),
        Some("bridge-token".into()),
    )
    .await
    .unwrap();
    assert_eq!(session.account().as_str(), "0xa11ce");

    let payload = EntryFunctionPayload::file_call(
        &fhv_ledger::ModuleAddress::parse(ADDRESS).unwrap(),
        "store_file_hash",
        &name("greeting.txt"),
        &sha256_digest(b"hello"),
    );
    let tx = session.sign_and_submit(&payload).await.unwrap();
    assert_eq!(tx.hash, "0xbeef");
}

#[tokio::test]
async fn bridge_unauthorized_is_authorization_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = WalletBridgeSession::connect(reqwest::Client::new(), server.uri().parse().unwrap(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::AuthorizationMissing);
}

#[tokio::test]
async fn refused_bridge_leaves_store_read_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/view"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[hello_record("0")]])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sign_and_submit"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = node_config(&server, ADDRESS);
    config.wallet_bridge_url = Some(server.uri().parse().unwrap());
    let store = LedgerRecordStore::connect(config).await.unwrap();
    assert!(!store.has_session());

    assert_eq!(store.list_all().await.unwrap().len(), 1);
    let err = store
        .upsert_by_name(&name("a.txt"), &sha256_digest(b"a"), &Author::placeholder())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::AuthorizationMissing);
}

#[tokio::test]
async fn unreachable_bridge_still_connects() {
    let server = MockServer::start().await;
    let mut config = node_config(&server, ADDRESS);
    config.wallet_bridge_url = Some("http://127.0.0.1:1".parse().unwrap());
    config.read_retries = 0;

    let store = LedgerRecordStore::connect(config).await.unwrap();
    assert!(!store.has_session());
}

#[tokio::test]
async fn bridge_user_decline_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/account"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "address": "0xa11ce" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/sign_and_submit"))
        .respond_with(ResponseTemplate::new(400).set_body_string("User declined the request"))
        .mount(&server)
        .await;

    let session = WalletBridgeSession::connect(reqwest::Client::new(), server.uri().parse().unwrap(), None)
        .await
        .unwrap();
    let payload = EntryFunctionPayload::file_call(
        &fhv_ledger::ModuleAddress::parse(ADDRESS).unwrap(),
        "verify_file_hash",
        &name("greeting.txt"),
        &sha256_digest(b"hello"),
    );
    let err = session.sign_and_submit(&payload).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::RemoteRejected);
    assert!(err.to_string().contains("User declined"));
}
