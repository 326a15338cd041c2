//! JSON-RPC transport tests.
//!
//! RpcContract runs against a wiremock server that answers the Ethereum
//! JSON-RPC methods the contract backend uses.
//!
//! Tests against a live node with the goal contract deployed are behind the
//! `live_rpc_tests` feature flag.

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use akuntabel::contract::interface;
use akuntabel::contract::rpc::RpcContract;
use akuntabel::contract::{ContractError, GoalContract, GoalEvent};
use akuntabel::core::goal::{CreateGoalRequest, Goal};
use akuntabel::core::identity::goal_id;
use akuntabel::core::types::{Address, Nonce, Wei};

const TX_HASH: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

fn address(s: &str) -> Address {
    Address::parse(s).unwrap()
}

fn owner() -> Address {
    address("0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266")
}

fn judge() -> Address {
    address("0x70997970c51812dc3a010c7d01b50e0d17dc79c8")
}

fn contract_address() -> Address {
    address("0x5fbdb2315678afecb367f032d93f642f64180aa3")
}

fn client(server: &MockServer) -> RpcContract {
    RpcContract::new(server.uri(), contract_address())
        .with_sender(owner())
        .with_confirmation(Duration::from_millis(5), Duration::from_millis(200))
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 0,
        "result": result,
    }))
}

fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 0,
        "error": { "code": code, "message": message },
    }))
}

fn hex(bytes: &[u8]) -> String {
    format!("0x{}", ::hex::encode(bytes))
}

fn rpc_method(name: &str) -> wiremock::matchers::BodyPartialJsonMatcher {
    body_partial_json(json!({ "method": name }))
}

fn sample_goal() -> Goal {
    Goal {
        owner: owner(),
        description: "Read 12 books".into(),
        stake: Wei::from_wei(10_000_000_000_000_000),
        judges: vec![judge()],
        required_approvals: 1,
        current_approvals: 0,
        verified_approvals: vec![false],
        milestone_descriptions: vec!["Six books".into(), "Twelve books".into()],
        milestone_achieved: vec![true, false],
        completed: false,
        funds_released: false,
    }
}

fn mined_receipt(status: &str) -> Value {
    json!({
        "transactionHash": TX_HASH,
        "blockNumber": "0x2a",
        "status": status,
    })
}

// =============================================================================
// Reads
// =============================================================================

mod read_tests {
    use super::*;

    #[tokio::test]
    async fn get_goal_details_decodes_call_result() {
        let server = MockServer::start().await;
        let goal = sample_goal();
        let id = goal_id(&owner(), Nonce::new(0));

        Mock::given(method("POST"))
            .and(rpc_method("eth_call"))
            .and(body_partial_json(json!({
                "params": [{ "data": hex(&interface::encode_get_goal_details(&id)) }]
            })))
            .respond_with(rpc_result(json!(hex(&interface::encode_goal_details(&goal)))))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = client(&server).get_goal_details(id).await.unwrap();
        assert_eq!(fetched, goal);
    }

    #[tokio::test]
    async fn user_goal_nonce_decodes_uint() {
        let server = MockServer::start().await;
        let mut word = [0u8; 32];
        word[31] = 3;

        Mock::given(method("POST"))
            .and(rpc_method("eth_call"))
            .respond_with(rpc_result(json!(hex(&word))))
            .mount(&server)
            .await;

        let nonce = client(&server).user_goal_nonce(&owner()).await.unwrap();
        assert_eq!(nonce, Nonce::new(3));
    }

    #[tokio::test]
    async fn block_number_parses_quantity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(rpc_method("eth_blockNumber"))
            .respond_with(rpc_result(json!("0x1b4")))
            .mount(&server)
            .await;

        assert_eq!(client(&server).block_number().await.unwrap(), 436);
    }

    #[tokio::test]
    async fn short_call_result_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(rpc_method("eth_call"))
            .respond_with(rpc_result(json!("0x")))
            .mount(&server)
            .await;

        let err = client(&server)
            .get_goal_details(goal_id(&owner(), Nonce::new(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Decode(_)));
    }

    #[tokio::test]
    async fn goal_events_decode_logs() {
        let server = MockServer::start().await;
        let id = goal_id(&owner(), Nonce::new(0));
        let milestone = GoalEvent::MilestoneAchieved {
            goal_id: id,
            milestone_index: 1,
            block_number: 7,
        };
        let approved = GoalEvent::GoalApproved {
            goal_id: id,
            judge: judge(),
            block_number: 8,
        };

        let log = |event: &GoalEvent, block: &str, removed: bool| {
            let (topics, data) = interface::encode_event(event);
            json!({
                "address": contract_address().to_string(),
                "topics": topics.iter().map(|t| hex(t)).collect::<Vec<_>>(),
                "data": hex(&data),
                "blockNumber": block,
                "removed": removed,
            })
        };

        Mock::given(method("POST"))
            .and(rpc_method("eth_getLogs"))
            .and(body_partial_json(json!({
                "params": [{ "fromBlock": "0x5", "toBlock": "0x8" }]
            })))
            .respond_with(rpc_result(json!([
                log(&milestone, "0x7", false),
                log(&approved, "0x8", false),
                log(&approved, "0x8", true),
            ])))
            .mount(&server)
            .await;

        let events = client(&server).goal_events(5, 8).await.unwrap();
        assert_eq!(events, vec![milestone, approved]);
    }
}

// =============================================================================
// Transactions
// =============================================================================

mod transaction_tests {
    use super::*;

    fn request() -> CreateGoalRequest {
        CreateGoalRequest {
            description: "Read 12 books".into(),
            judges: vec![judge()],
            milestones: vec!["Six books".into()],
            required_approvals: 1,
            stake: Wei::from_wei(10_000_000_000_000_000),
        }
    }

    #[tokio::test]
    async fn create_sends_value_and_waits_for_receipt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(rpc_method("eth_sendTransaction"))
            .and(body_partial_json(json!({
                "params": [{
                    "from": owner().to_string(),
                    "to": contract_address().to_string(),
                    "value": "0x2386f26fc10000",
                }]
            })))
            .respond_with(rpc_result(json!(TX_HASH)))
            .expect(1)
            .mount(&server)
            .await;

        // Pending once, then mined.
        Mock::given(method("POST"))
            .and(rpc_method("eth_getTransactionReceipt"))
            .respond_with(rpc_result(Value::Null))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(rpc_method("eth_getTransactionReceipt"))
            .respond_with(rpc_result(mined_receipt("0x1")))
            .mount(&server)
            .await;

        let receipt = client(&server).create_goal(&request()).await.unwrap();
        assert_eq!(receipt.tx_hash, TX_HASH);
        assert_eq!(receipt.block_number, 42);
    }

    #[tokio::test]
    async fn failed_status_is_transaction_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(rpc_method("eth_sendTransaction"))
            .respond_with(rpc_result(json!(TX_HASH)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(rpc_method("eth_getTransactionReceipt"))
            .respond_with(rpc_result(mined_receipt("0x0")))
            .mount(&server)
            .await;

        let id = goal_id(&owner(), Nonce::new(0));
        let err = client(&server).approve_goal(id).await.unwrap_err();
        assert_eq!(
            err,
            ContractError::TransactionFailed {
                tx_hash: TX_HASH.into()
            }
        );
    }

    #[tokio::test]
    async fn receipt_wait_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(rpc_method("eth_sendTransaction"))
            .respond_with(rpc_result(json!(TX_HASH)))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(rpc_method("eth_getTransactionReceipt"))
            .respond_with(rpc_result(Value::Null))
            .mount(&server)
            .await;

        let id = goal_id(&owner(), Nonce::new(0));
        let err = client(&server).achieve_milestone(id, 0).await.unwrap_err();
        assert!(matches!(err, ContractError::Timeout { ref tx_hash, .. } if tx_hash == TX_HASH));
    }

    #[tokio::test]
    async fn revert_reason_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(rpc_method("eth_sendTransaction"))
            .respond_with(rpc_error(3, "execution reverted: Only judges can approve"))
            .mount(&server)
            .await;

        let id = goal_id(&owner(), Nonce::new(0));
        let err = client(&server).approve_goal(id).await.unwrap_err();
        assert_eq!(err, ContractError::Reverted("Only judges can approve".into()));
    }

    #[tokio::test]
    async fn missing_sender_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_result(json!(TX_HASH)))
            .expect(0)
            .mount(&server)
            .await;

        let contract = RpcContract::new(server.uri(), contract_address());
        let err = contract.create_goal(&request()).await.unwrap_err();
        assert_eq!(err, ContractError::NoSender);
    }
}

// =============================================================================
// Transport errors
// =============================================================================

mod error_tests {
    use super::*;

    #[tokio::test]
    async fn http_error_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("node is syncing"))
            .mount(&server)
            .await;

        let err = client(&server).block_number().await.unwrap_err();
        assert_eq!(
            err,
            ContractError::ApiError {
                status: 503,
                message: "node is syncing".into()
            }
        );
    }

    #[tokio::test]
    async fn rpc_error_keeps_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_error(-32601, "method not found"))
            .mount(&server)
            .await;

        let err = client(&server).block_number().await.unwrap_err();
        assert_eq!(
            err,
            ContractError::Rpc {
                code: -32601,
                message: "method not found".into()
            }
        );
    }

    #[tokio::test]
    async fn unreachable_node_is_network_error() {
        let contract = RpcContract::new("http://127.0.0.1:9", contract_address());
        let err = contract.block_number().await.unwrap_err();
        assert!(matches!(err, ContractError::NetworkError(_)));
    }
}

// =============================================================================
// Live node tests (behind feature flag)
// =============================================================================

#[cfg(feature = "live_rpc_tests")]
mod live_tests {
    use super::*;
    use akuntabel::core::goal::GoalDraft;
    use akuntabel::core::identity::NonceStrategy;
    use akuntabel::goals::actions::{GoalActions, Verification};
    use akuntabel::goals::nonce::GoalNonceTracker;
    use akuntabel::goals::reader::GoalStateReader;

    /// Node URL, deployed contract, and an account the node signs for.
    fn live_target() -> Option<(String, Address, Address)> {
        let url = std::env::var("AKUNTABEL_TEST_RPC_URL").ok()?;
        let contract = Address::parse(&std::env::var("AKUNTABEL_TEST_CONTRACT").ok()?).ok()?;
        let account = Address::parse(&std::env::var("AKUNTABEL_TEST_ACCOUNT").ok()?).ok()?;
        Some((url, contract, account))
    }

    fn live_contract(url: String, contract: Address, account: Address) -> RpcContract {
        RpcContract::new(url, contract)
            .with_sender(account)
            .with_confirmation(Duration::from_millis(200), Duration::from_secs(60))
    }

    #[tokio::test]
    async fn live_created_goal_reads_back_consistent() {
        let Some((url, contract, account)) = live_target() else {
            eprintln!("Skipping: AKUNTABEL_TEST_RPC_URL/AKUNTABEL_TEST_CONTRACT/AKUNTABEL_TEST_ACCOUNT not set");
            return;
        };
        let contract = live_contract(url, contract, account);

        let draft = GoalDraft {
            description: "Live node check".into(),
            judges: vec![judge().to_string()],
            milestones: vec!["First step".into()],
            required_approvals: 1,
            stake: "0.001".into(),
        };
        let outcome = GoalActions::new(&contract, NonceStrategy::Refetch)
            .create(&draft)
            .await
            .unwrap();
        assert_eq!(outcome.verification, Verification::Confirmed);

        let id = outcome.goal_id.unwrap();
        let snapshot = GoalStateReader::new(&contract).read(id).await.unwrap();
        assert_eq!(snapshot.goal.owner, account);
        assert!(snapshot.goal.check_invariants().is_empty());
    }

    #[tokio::test]
    async fn live_every_goal_satisfies_invariants() {
        let Some((url, contract, account)) = live_target() else {
            eprintln!("Skipping: AKUNTABEL_TEST_RPC_URL/AKUNTABEL_TEST_CONTRACT/AKUNTABEL_TEST_ACCOUNT not set");
            return;
        };
        let contract = live_contract(url, contract, account);
        let reader = GoalStateReader::new(&contract);

        for (_, id) in GoalNonceTracker::new(&contract).goal_ids(&account).await.unwrap() {
            let snapshot = reader.read(id).await.unwrap();
            assert!(
                snapshot.is_consistent(),
                "goal {} violates {:?}",
                id,
                snapshot.violations
            );
        }
    }
}
