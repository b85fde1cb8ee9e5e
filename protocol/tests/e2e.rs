//! End-to-end integration tests for the microloan protocol library.
//!
//! These walk the same path the wallet and backend take together: derive a
//! zkLogin address from an OAuth token, have the service build a transaction
//! for it against an in-memory ledger, sign it with the session's ephemeral
//! key, execute it, then read the resulting objects back.
//!
//! Each test builds its own ledger. No shared state, no network.

use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde_json::json;

use microloan_protocol::config::{ProgramConfig, KEY_CLAIM_NAME, SUI_COIN_TYPE};
use microloan_protocol::crypto::EphemeralKeypair;
use microloan_protocol::ledger::memory::{mock_coin, mock_object};
use microloan_protocol::ledger::{InMemoryLedger, Ledger};
use microloan_protocol::service::{MicroloanCall, MicroloanService, ServiceError};
use microloan_protocol::transaction::{sign_zklogin_transaction, TransactionData};
use microloan_protocol::types::{Owner, SuiAddress};
use microloan_protocol::zklogin::{
    decode_claims, gen_address_seed, generate_nonce, jwt_to_address, ZkLoginProof,
    ZkLoginSignature,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const SALT: &str = "129390038577185583942388216820280642146";

fn jwt(nonce: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let claims = json!({
        "iss": "https://accounts.google.com",
        "sub": "110463452167303598383",
        "aud": "microloan.apps.googleusercontent.com",
        "nonce": nonce,
    });
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

fn proof() -> ZkLoginProof {
    serde_json::from_value(json!({
        "proofPoints": {
            "a": ["1", "2", "1"],
            "b": [["3", "4"], ["5", "6"], ["1", "0"]],
            "c": ["7", "8", "1"]
        },
        "issBase64Details": {"value": "aXNz", "indexMod4": 1},
        "headerBase64": "eyJhbGciOiJSUzI1NiJ9"
    }))
    .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_build_sign_execute() {
    let ephemeral = EphemeralKeypair::generate();
    let max_epoch = 12;
    let nonce = generate_nonce(&ephemeral, max_epoch, "4242").unwrap();
    let token = jwt(&nonce);
    let address = jwt_to_address(&token, SALT).unwrap();

    let ledger = Arc::new(
        InMemoryLedger::new()
            .with_epoch(10)
            .with_coin(address, mock_coin("0xc0ffee", 2_000_000_000)),
    );
    let service = MicroloanService::new(ledger.clone(), ProgramConfig::default());

    // Backend builds for the address the wallet gave it.
    let built = service
        .build(
            address,
            MicroloanCall::CreateLoan {
                amount: 1_000_000_000,
                interest_bps: 500,
                due_epoch: 100,
            },
        )
        .await
        .unwrap();
    assert_eq!(built.gas_coin, "0xc0ffee".parse().unwrap());

    // Wallet rebinds the sender, signs and submits.
    let mut tx = TransactionData::from_base64(&built.transaction_bytes).unwrap();
    tx.set_sender(address);
    let claims = decode_claims(&token).unwrap();
    let seed = gen_address_seed(SALT, KEY_CLAIM_NAME, &claims.sub, &claims.aud).unwrap();
    let signed =
        sign_zklogin_transaction(&tx, &ephemeral, proof().into_inputs(seed.clone()), max_epoch)
            .unwrap();
    let outcome = ledger.execute(&signed).await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.digest, built.digest);

    let executed = ledger.executed();
    assert_eq!(executed.len(), 1);
    let sig_bytes = STANDARD.decode(&executed[0].signatures[0]).unwrap();
    assert_eq!(sig_bytes[0], 0x05);
    let sig = ZkLoginSignature::from_bytes(&sig_bytes).unwrap();
    assert_eq!(sig.inputs.address_seed, seed);
    assert_eq!(sig.max_epoch, max_epoch);
}

#[tokio::test]
async fn queries_after_writes() {
    let owner: SuiAddress = "0xabc".parse().unwrap();
    let program = ProgramConfig::default();
    let ledger = Arc::new(InMemoryLedger::new());
    let service = MicroloanService::new(ledger.clone(), program.clone());

    assert!(matches!(
        service.reputation(owner).await,
        Err(ServiceError::NotFound("Reputation not found"))
    ));

    ledger.insert_object(mock_object(
        "0x5e",
        program.reputation_type(),
        Owner::AddressOwner(owner),
        json!({"score": "10"}),
    ));
    ledger.insert_object(mock_object(
        "0x10a",
        program.loan_request_type(),
        Owner::Shared {
            initial_shared_version: 3,
        },
        json!({
            "id": {"id": "0x10a"},
            "amount": "1000000000",
            "interest_bps": "500",
            "due_epoch": "100",
            "backed": false,
            "backer": null,
            "requester": owner.to_string(),
            "escrow_id": null
        }),
    ));

    let rep = service.reputation(owner).await.unwrap();
    assert_eq!(rep.score, json!("10"));

    let loan = service.loan("0x10a".parse().unwrap()).await.unwrap();
    assert_eq!(loan.requester, Some(owner));
    assert_eq!(loan.amount_due(), 1_050_000_000);
    assert!(!loan.backed);
}

#[tokio::test]
async fn balance_covers_all_coins() {
    let owner: SuiAddress = "0xabc".parse().unwrap();
    let ledger = InMemoryLedger::new()
        .with_coin(owner, mock_coin("0x1", 1_500_000_000))
        .with_coin(owner, mock_coin("0x2", 500_000_000));
    assert_eq!(
        ledger.balance(owner, SUI_COIN_TYPE).await.unwrap(),
        2_000_000_000
    );
}
