//! End-to-end consensus engine behavior against the mock chain client.

use alloy_primitives::{address, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};

use oracle_client::{MockChainClient, MockWallet, RpcLog, SubmitOptions};
use oracle_consensus::{
    apply_ready, read_threshold, scan_commitments, select_ready, ScanConfig,
};
use oracle_core::abi::IBlockHashOracle;

const ORACLE: Address = Address::repeat_byte(0x0a);

fn commit_log(committer: Address, number: u64, hash: B256) -> RpcLog {
    RpcLog {
        address: ORACLE,
        topics: vec![
            IBlockHashOracle::CommitBlockHash::SIGNATURE_HASH,
            committer.into_word(),
            B256::from(U256::from(number).to_be_bytes::<32>()),
            hash,
        ],
        data: Bytes::new(),
        block_number: None,
    }
}

fn stage_threshold(client: &MockChainClient, threshold: u64) {
    let data = Bytes::from(IBlockHashOracle::thresholdCall {}.abi_encode());
    let ret = Bytes::from(U256::from(threshold).to_be_bytes::<32>().to_vec());
    client.set_call_return(ORACLE, data, ret);
}

fn stage_applied_hash(client: &MockChainClient, number: u64, hash: B256) {
    let data = Bytes::from(
        IBlockHashOracle::get_block_hashCall {
            number: U256::from(number),
        }
        .abi_encode(),
    );
    client.set_call_return(ORACLE, data, Bytes::from(hash.to_vec()));
}

#[tokio::test]
async fn three_commits_one_threshold_two_yields_single_apply() {
    let client = MockChainClient::new();
    client.set_latest_block(1000);
    stage_threshold(&client, 2);

    let hash = B256::repeat_byte(0x5a);
    let a = address!("0000000000000000000000000000000000000001");
    let b = address!("0000000000000000000000000000000000000080");
    let c = address!("00000000000000000000000000000000000000ff");
    client.push_log(990, commit_log(c, 700, hash));
    client.push_log(991, commit_log(a, 700, hash));
    client.push_log(992, commit_log(b, 700, hash));

    let commitments = scan_commitments(&client, ORACLE, &ScanConfig::default())
        .await
        .unwrap();
    let threshold = read_threshold(&client, ORACLE).await.unwrap();
    assert_eq!(threshold, 2);

    let ready = select_ready(&client, ORACLE, &commitments, threshold)
        .await
        .unwrap();
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].number, 700);
    assert_eq!(ready[0].hash, hash);
    // Numeric ascending regardless of observation order.
    assert_eq!(ready[0].committers, vec![a, b, c]);
}

#[tokio::test]
async fn lone_commit_below_threshold_yields_nothing() {
    let client = MockChainClient::new();
    client.set_latest_block(1000);

    client.push_log(
        990,
        commit_log(Address::repeat_byte(0x01), 700, B256::repeat_byte(0x5a)),
    );

    let commitments = scan_commitments(&client, ORACLE, &ScanConfig::default())
        .await
        .unwrap();
    let ready = select_ready(&client, ORACLE, &commitments, 2).await.unwrap();
    assert!(ready.is_empty());
}

#[tokio::test]
async fn already_applied_number_is_excluded() {
    let client = MockChainClient::new();
    client.set_latest_block(1000);

    let hash = B256::repeat_byte(0x5a);
    client.push_log(990, commit_log(Address::repeat_byte(0x01), 700, hash));
    client.push_log(991, commit_log(Address::repeat_byte(0x02), 700, hash));
    stage_applied_hash(&client, 700, hash);

    let commitments = scan_commitments(&client, ORACLE, &ScanConfig::default())
        .await
        .unwrap();
    let ready = select_ready(&client, ORACLE, &commitments, 2).await.unwrap();
    assert!(ready.is_empty());
}

#[tokio::test]
async fn unapplied_number_survives_selection_when_call_reverts() {
    // No staged get_block_hash return: the mock reverts, which counts as
    // "no hash applied yet".
    let client = MockChainClient::new();
    client.set_latest_block(1000);

    let hash = B256::repeat_byte(0x5a);
    client.push_log(990, commit_log(Address::repeat_byte(0x01), 700, hash));
    client.push_log(991, commit_log(Address::repeat_byte(0x02), 700, hash));

    let commitments = scan_commitments(&client, ORACLE, &ScanConfig::default())
        .await
        .unwrap();
    let ready = select_ready(&client, ORACLE, &commitments, 2).await.unwrap();
    assert_eq!(ready.len(), 1);
}

#[tokio::test]
async fn apply_submits_encoded_call() {
    let client = MockChainClient::new();
    client.set_latest_block(1000);
    let wallet = MockWallet::new(Address::repeat_byte(0x77));

    let hash = B256::repeat_byte(0x5a);
    client.push_log(990, commit_log(Address::repeat_byte(0x01), 700, hash));
    client.push_log(991, commit_log(Address::repeat_byte(0x02), 700, hash));

    let commitments = scan_commitments(&client, ORACLE, &ScanConfig::default())
        .await
        .unwrap();
    let ready = select_ready(&client, ORACLE, &commitments, 2).await.unwrap();

    let tx = apply_ready(&client, &wallet, ORACLE, &ready[0], &SubmitOptions::default())
        .await
        .unwrap();
    assert_ne!(tx, B256::ZERO);

    // The calldata rides at the tail of the mock wallet's raw bytes.
    let sent = client.sent_transactions();
    assert_eq!(sent.len(), 1);
    let expected = IBlockHashOracle::applyCall {
        number: U256::from(700u64),
        hash,
        committers: ready[0].committers.clone(),
    }
    .abi_encode();
    assert!(sent[0].ends_with(&expected));
}
