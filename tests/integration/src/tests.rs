//! Integration tests for the tiered staking lottery.
//!
//! The stake token and the randomness coordinator run as two mocked
//! instances. Cross-contract calls are carried by hand: every
//! `WasmMsg::Execute` a contract emits is decoded and fed into the target's
//! `execute` entry point with the emitting contract as sender, which is what
//! the chain does after the first call commits.
//!
//! Run:
//! ```bash
//! cargo test -p tierstake-integration-tests
//! ```

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    coin, from_json, Addr, Binary, Coin, CosmosMsg, Env, MemoryStorage, OwnedDeps, Response,
    Timestamp, Uint128, Uint256, WasmMsg,
};
use tierstake_common::{derive_request_id, random_value_from_bytes, RoundStatus};
use tierstake_randomness_coordinator as coordinator;
use tierstake_token as token;

type MockDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

// ─── Constants ───

/// Real drand quicknet public key
const QUICKNET_PK_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";

/// Real quicknet test vector: round 1000
const TEST_ROUND: u64 = 1000;
const TEST_SIG_HEX: &str = "b44679b9a59af2ec876b1a6b1ad52ea9b1615fc3982b19576350f93447cb1125e342b73a8dd2bacbe47e4b6b63ed5e39";
const TEST_RANDOMNESS_HEX: &str =
    "fe290beca10872ef2fb164d2aa4442de4566183ec51c56ff3cd603d930e54fdd";

const GENESIS: u64 = 1692803367;
const PERIOD: u64 = 3;
/// First second at which round 999 is the latest published round, so fresh
/// requests are bound to round 1000.
const ROUND_999_AT: u64 = GENESIS + 998 * PERIOD;

const SUPPLY: u128 = 1_000_000;
const FEE_DENOM: &str = "ulink";

// ─── Harness ───

struct Harness {
    token: MockDeps,
    coordinator: MockDeps,
    token_addr: Addr,
    coordinator_addr: Addr,
    api: MockApi,
}

fn env_at(contract: &Addr, seconds: u64) -> Env {
    let mut env = mock_env();
    env.block.time = Timestamp::from_seconds(seconds);
    env.contract.address = contract.clone();
    env
}

fn setup() -> Harness {
    let api = MockApi::default();
    let admin = api.addr_make("admin");
    let operator = api.addr_make("operator");
    let token_addr = api.addr_make("stake_token");
    let coordinator_addr = api.addr_make("coordinator");

    let mut coordinator = mock_dependencies();
    coordinator::contract::instantiate(
        coordinator.as_mut(),
        env_at(&coordinator_addr, GENESIS),
        message_info(&admin, &[]),
        coordinator::msg::InstantiateMsg {
            operators: vec![operator.to_string()],
            quicknet_pubkey_hex: QUICKNET_PK_HEX.to_string(),
            chain_hash: "52db9ba70e0cc0f6eaf7803dd07447a1f5477735fd3f661792ba94600c84e971"
                .to_string(),
            genesis_time: GENESIS,
            period_seconds: PERIOD,
            fee: Some(coin(100, FEE_DENOM)),
        },
    )
    .unwrap();

    let mut token = mock_dependencies();
    let tier = |name: &str, face_value: u128| token::msg::TierInit {
        name: name.to_string(),
        face_value: Uint128::new(face_value),
        initial_supply: Uint128::new(SUPPLY),
    };
    token::contract::instantiate(
        token.as_mut(),
        env_at(&token_addr, GENESIS),
        message_info(&admin, &[]),
        token::msg::InstantiateMsg {
            tiers: vec![
                tier("bronze", 1),
                tier("silver", 1_000),
                tier("gold", 1_000_000),
            ],
            initial_holder: Some(api.addr_make("treasury").to_string()),
            coordinator: coordinator_addr.to_string(),
            randomness_fee: Some(coin(100, FEE_DENOM)),
        },
    )
    .unwrap();

    Harness {
        token,
        coordinator,
        token_addr,
        coordinator_addr,
        api,
    }
}

impl Harness {
    fn addr(&self, name: &str) -> Addr {
        self.api.addr_make(name)
    }

    fn token_exec(
        &mut self,
        sender: &Addr,
        seconds: u64,
        msg: token::msg::ExecuteMsg,
    ) -> Result<Response, token::ContractError> {
        let env = env_at(&self.token_addr, seconds);
        token::contract::execute(self.token.as_mut(), env, message_info(sender, &[]), msg)
    }

    fn fund(&mut self, to: &Addr, tier_id: u8, amount: u128) {
        let treasury = self.addr("treasury");
        self.token_exec(
            &treasury,
            GENESIS,
            token::msg::ExecuteMsg::Transfer {
                from: treasury.to_string(),
                to: to.to_string(),
                tier_id,
                amount: Uint128::new(amount),
            },
        )
        .unwrap();
    }

    fn enter(&mut self, who: &Addr, tier_id: u8, amount: u128, seconds: u64) {
        self.token_exec(
            who,
            seconds,
            token::msg::ExecuteMsg::EnterRound {
                tier_id,
                amount: Uint128::new(amount),
                participant: None,
            },
        )
        .unwrap();
    }

    fn balance(&self, owner: &Addr, tier_id: u8) -> Uint128 {
        let res = token::contract::query(
            self.token.as_ref(),
            env_at(&self.token_addr, GENESIS),
            token::msg::QueryMsg::Balance {
                owner: owner.to_string(),
                tier_id,
            },
        )
        .unwrap();
        from_json::<token::msg::BalanceResponse>(res).unwrap().balance
    }

    fn round(&self) -> token::msg::RoundResponse {
        let res = token::contract::query(
            self.token.as_ref(),
            env_at(&self.token_addr, GENESIS),
            token::msg::QueryMsg::Round {},
        )
        .unwrap();
        from_json(res).unwrap()
    }

    fn escrow(&self) -> Vec<Uint128> {
        let res = token::contract::query(
            self.token.as_ref(),
            env_at(&self.token_addr, GENESIS),
            token::msg::QueryMsg::Escrow {},
        )
        .unwrap();
        from_json::<token::msg::EscrowResponse>(res)
            .unwrap()
            .balances
    }

    fn recent_winner(&self) -> Option<Addr> {
        let res = token::contract::query(
            self.token.as_ref(),
            env_at(&self.token_addr, GENESIS),
            token::msg::QueryMsg::RecentWinner {},
        )
        .unwrap();
        from_json(res).unwrap()
    }

    /// Deliver the token's outbound randomness request to the coordinator.
    fn forward_request(
        &mut self,
        close_res: &Response,
        seconds: u64,
    ) -> Result<Response, coordinator::ContractError> {
        let (target, msg, funds) = single_wasm_execute(close_res);
        assert_eq!(target, self.coordinator_addr.to_string());
        let msg: coordinator::msg::ExecuteMsg = from_json(msg).unwrap();
        coordinator::contract::execute(
            self.coordinator.as_mut(),
            env_at(&self.coordinator_addr, seconds),
            message_info(&self.token_addr, &funds),
            msg,
        )
    }

    /// Relay the round 1000 beacon for `request_id` as the operator.
    fn relay_beacon(&mut self, request_id: &str, seconds: u64) -> Response {
        let operator = self.addr("operator");
        coordinator::contract::execute(
            self.coordinator.as_mut(),
            env_at(&self.coordinator_addr, seconds),
            message_info(&operator, &[]),
            coordinator::msg::ExecuteMsg::FulfillRequest {
                consumer: self.token_addr.to_string(),
                request_id: request_id.to_string(),
                signature_hex: TEST_SIG_HEX.to_string(),
            },
        )
        .unwrap()
    }

    /// Deliver the coordinator's callback to the token.
    fn deliver_callback(
        &mut self,
        fulfill_res: &Response,
        seconds: u64,
    ) -> Result<Response, token::ContractError> {
        let (target, msg, funds) = single_wasm_execute(fulfill_res);
        assert_eq!(target, self.token_addr.to_string());
        assert!(funds.is_empty());
        let msg: token::msg::ExecuteMsg = from_json(msg).unwrap();
        let sender = self.coordinator_addr.clone();
        self.token_exec(&sender, seconds, msg)
    }

    fn assert_conserved(&self, holders: &[Addr]) {
        let escrow = self.escrow();
        for tier_id in 0..3u8 {
            let held: Uint128 = holders.iter().map(|h| self.balance(h, tier_id)).sum();
            assert_eq!(
                held + escrow[usize::from(tier_id)],
                Uint128::new(SUPPLY),
                "tier {tier_id} not conserved"
            );
        }
    }
}

fn single_wasm_execute(res: &Response) -> (String, Binary, Vec<Coin>) {
    assert_eq!(res.messages.len(), 1);
    match &res.messages[0].msg {
        CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr,
            msg,
            funds,
        }) => (contract_addr.clone(), msg.clone(), funds.clone()),
        other => panic!("unexpected message: {other:?}"),
    }
}

fn attr(res: &Response, key: &str) -> String {
    res.attributes
        .iter()
        .find(|a| a.key == key)
        .map(|a| a.value.clone())
        .unwrap()
}

fn beacon_random_value() -> Uint256 {
    let bytes: [u8; 32] = hex::decode(TEST_RANDOMNESS_HEX)
        .unwrap()
        .try_into()
        .unwrap();
    random_value_from_bytes(&bytes)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_full_stake_and_draw_cycle() {
    let mut h = setup();
    let treasury = h.addr("treasury");
    let alice = h.addr("alice");
    let bob = h.addr("bob");
    let carol = h.addr("carol");

    h.fund(&alice, 0, 400);
    h.fund(&bob, 1, 2);
    h.fund(&carol, 0, 600);

    // 1. Open a 60s round ending exactly when round 999 is published
    let opened_at = ROUND_999_AT - 60;
    h.token_exec(
        &alice,
        opened_at,
        token::msg::ExecuteMsg::StartRound {
            duration_seconds: 60,
        },
    )
    .unwrap();

    // 2. Tickets: alice [0, 400), bob [400, 2400), carol [2400, 3000)
    h.enter(&alice, 0, 400, opened_at + 1);
    h.enter(&bob, 1, 2, opened_at + 2);
    h.enter(&carol, 0, 600, opened_at + 3);
    assert_eq!(h.round().total_tickets, Uint128::new(3_000));
    assert_eq!(
        h.escrow(),
        vec![Uint128::new(1_000), Uint128::new(2), Uint128::zero()]
    );
    h.assert_conserved(&[treasury.clone(), alice.clone(), bob.clone(), carol.clone()]);

    // 3. Close and forward the fee-carrying request
    let close_res = h
        .token_exec(&carol, ROUND_999_AT, token::msg::ExecuteMsg::CloseRound {})
        .unwrap();
    let request_id = attr(&close_res, "request_id");
    let (_, _, funds) = single_wasm_execute(&close_res);
    assert_eq!(funds, vec![coin(100, FEE_DENOM)]);

    let req_res = h.forward_request(&close_res, ROUND_999_AT).unwrap();
    assert_eq!(attr(&req_res, "target_round"), TEST_ROUND.to_string());
    assert_eq!(h.round().status, RoundStatus::Closed);

    // 4. Operator relays the round 1000 beacon, coordinator calls back
    let fulfill_res = h.relay_beacon(&request_id, ROUND_999_AT + 5);
    let settle_res = h.deliver_callback(&fulfill_res, ROUND_999_AT + 5).unwrap();

    // fe290b... mod 3000 = 733, inside bob's range
    let settled = settle_res
        .events
        .iter()
        .find(|e| e.ty == "tierstake_round_settled")
        .unwrap();
    let winning_ticket = settled
        .attributes
        .iter()
        .find(|a| a.key == "winning_ticket")
        .unwrap();
    assert_eq!(winning_ticket.value, "733");
    assert_eq!(attr(&settle_res, "winner"), bob.to_string());
    assert_eq!(h.recent_winner(), Some(bob.clone()));

    // 5. Pool paid out in every tier it was staked in
    assert_eq!(h.balance(&bob, 0), Uint128::new(1_000));
    assert_eq!(h.balance(&bob, 1), Uint128::new(2));
    assert_eq!(h.balance(&alice, 0), Uint128::zero());
    assert_eq!(h.balance(&carol, 0), Uint128::zero());
    assert_eq!(h.escrow(), vec![Uint128::zero(); 3]);
    h.assert_conserved(&[treasury, alice, bob, carol]);

    let round = h.round();
    assert_eq!(round.status, RoundStatus::Idle);
    assert_eq!(round.total_tickets, Uint128::zero());
    assert_eq!(round.pending_request, None);

    // 6. Both sides keep the fulfilled record
    let res = token::contract::query(
        h.token.as_ref(),
        env_at(&h.token_addr, ROUND_999_AT),
        token::msg::QueryMsg::RandomnessRequest {
            request_id: request_id.clone(),
        },
    )
    .unwrap();
    let record: Option<token::state::RandomnessRequest> = from_json(res).unwrap();
    assert_eq!(record.unwrap().random_value, Some(beacon_random_value()));

    let res = coordinator::contract::query(
        h.coordinator.as_ref(),
        env_at(&h.coordinator_addr, ROUND_999_AT),
        coordinator::msg::QueryMsg::Request {
            consumer: h.token_addr.to_string(),
            request_id,
        },
    )
    .unwrap();
    let record: Option<coordinator::state::PendingRequest> = from_json(res).unwrap();
    let record = record.unwrap();
    assert!(record.fulfilled);
    assert_eq!(record.consumer, h.token_addr);
}

#[test]
fn test_duplicate_delivery_is_rejected() {
    let mut h = setup();
    let alice = h.addr("alice");
    h.fund(&alice, 2, 1);

    let opened_at = ROUND_999_AT - 10;
    h.token_exec(
        &alice,
        opened_at,
        token::msg::ExecuteMsg::StartRound {
            duration_seconds: 10,
        },
    )
    .unwrap();
    h.enter(&alice, 2, 1, opened_at);

    let close_res = h
        .token_exec(&alice, ROUND_999_AT, token::msg::ExecuteMsg::CloseRound {})
        .unwrap();
    let request_id = attr(&close_res, "request_id");

    // The request reaches the coordinator once; a replay is refused
    h.forward_request(&close_res, ROUND_999_AT).unwrap();
    let err = h.forward_request(&close_res, ROUND_999_AT).unwrap_err();
    assert!(matches!(
        err,
        coordinator::ContractError::RequestAlreadyExists { .. }
    ));

    let fulfill_res = h.relay_beacon(&request_id, ROUND_999_AT + 3);
    h.deliver_callback(&fulfill_res, ROUND_999_AT + 3).unwrap();
    assert_eq!(h.balance(&alice, 2), Uint128::new(1));

    // A second copy of the same callback is an error, not a no-op
    let err = h
        .deliver_callback(&fulfill_res, ROUND_999_AT + 4)
        .unwrap_err();
    assert!(matches!(err, token::ContractError::AlreadyFulfilled { .. }));

    let operator = h.addr("operator");
    let err = coordinator::contract::execute(
        h.coordinator.as_mut(),
        env_at(&h.coordinator_addr, ROUND_999_AT + 4),
        message_info(&operator, &[]),
        coordinator::msg::ExecuteMsg::FulfillRequest {
            consumer: h.token_addr.to_string(),
            request_id,
            signature_hex: TEST_SIG_HEX.to_string(),
        },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        coordinator::ContractError::AlreadyFulfilled { .. }
    ));
}

#[test]
fn test_forged_callback_is_rejected() {
    let mut h = setup();
    let alice = h.addr("alice");
    let mallory = h.addr("mallory");
    h.fund(&alice, 0, 10);

    let opened_at = ROUND_999_AT - 10;
    h.token_exec(
        &alice,
        opened_at,
        token::msg::ExecuteMsg::StartRound {
            duration_seconds: 10,
        },
    )
    .unwrap();
    h.enter(&alice, 0, 10, opened_at);
    let close_res = h
        .token_exec(&alice, ROUND_999_AT, token::msg::ExecuteMsg::CloseRound {})
        .unwrap();
    let request_id = attr(&close_res, "request_id");

    let err = h
        .token_exec(
            &mallory,
            ROUND_999_AT + 1,
            token::msg::ExecuteMsg::FulfillRandomness {
                request_id,
                random_value: Uint256::zero(),
            },
        )
        .unwrap_err();
    assert!(matches!(err, token::ContractError::Unauthorized { .. }));

    assert_eq!(h.round().status, RoundStatus::Closed);
    assert_eq!(h.escrow()[0], Uint128::new(10));
    assert_eq!(h.recent_winner(), None);
}

#[test]
fn test_multiple_rounds_share_a_beacon() {
    let mut h = setup();
    let treasury = h.addr("treasury");
    let alice = h.addr("alice");
    let carol = h.addr("carol");
    h.fund(&alice, 0, 1);
    h.fund(&carol, 0, 2);
    h.fund(&carol, 1, 1);

    // Round 1: carol alone
    let opened_at = ROUND_999_AT - 5;
    h.token_exec(
        &carol,
        opened_at,
        token::msg::ExecuteMsg::StartRound {
            duration_seconds: 5,
        },
    )
    .unwrap();
    h.enter(&carol, 1, 1, opened_at);
    let close_res = h
        .token_exec(&carol, ROUND_999_AT, token::msg::ExecuteMsg::CloseRound {})
        .unwrap();
    let first_id = attr(&close_res, "request_id");
    h.forward_request(&close_res, ROUND_999_AT).unwrap();
    let fulfill_res = h.relay_beacon(&first_id, ROUND_999_AT);
    h.deliver_callback(&fulfill_res, ROUND_999_AT).unwrap();
    assert_eq!(h.recent_winner(), Some(carol.clone()));
    assert_eq!(h.balance(&carol, 1), Uint128::new(1));

    // Round 2 closes while round 999 is still the latest, so it is bound to
    // round 1000 as well: alice [0, 1), carol [1, 3)
    h.token_exec(
        &alice,
        ROUND_999_AT + 1,
        token::msg::ExecuteMsg::StartRound {
            duration_seconds: 1,
        },
    )
    .unwrap();
    let round = h.round();
    assert_eq!(round.round_id, 2);
    assert_eq!(round.entry_count, 0);
    assert_eq!(round.total_tickets, Uint128::zero());

    h.enter(&alice, 0, 1, ROUND_999_AT + 1);
    h.enter(&carol, 0, 2, ROUND_999_AT + 1);
    let close_res = h
        .token_exec(&alice, ROUND_999_AT + 2, token::msg::ExecuteMsg::CloseRound {})
        .unwrap();
    let second_id = attr(&close_res, "request_id");
    assert_ne!(first_id, second_id);

    let req_res = h.forward_request(&close_res, ROUND_999_AT + 2).unwrap();
    assert_eq!(attr(&req_res, "target_round"), TEST_ROUND.to_string());
    let fulfill_res = h.relay_beacon(&second_id, ROUND_999_AT + 4);
    let settle_res = h.deliver_callback(&fulfill_res, ROUND_999_AT + 4).unwrap();

    // fe290b... mod 3 = 1
    assert_eq!(attr(&settle_res, "winner"), carol.to_string());
    assert_eq!(h.balance(&carol, 0), Uint128::new(3));
    assert_eq!(h.balance(&alice, 0), Uint128::zero());
    h.assert_conserved(&[treasury, alice, carol]);

    let res = coordinator::contract::query(
        h.coordinator.as_ref(),
        env_at(&h.coordinator_addr, ROUND_999_AT),
        coordinator::msg::QueryMsg::LatestRound {},
    )
    .unwrap();
    let latest: u64 = serde_json::from_slice(&res).unwrap();
    assert_eq!(latest, TEST_ROUND);
}

#[test]
fn test_preregistered_request_id_does_not_block_close() {
    let mut h = setup();
    let alice = h.addr("alice");
    let mallory = h.addr("mallory");
    h.fund(&alice, 0, 10);

    let opened_at = ROUND_999_AT - 10;
    h.token_exec(
        &alice,
        opened_at,
        token::msg::ExecuteMsg::StartRound {
            duration_seconds: 10,
        },
    )
    .unwrap();
    h.enter(&alice, 0, 10, opened_at);

    // The token's next id is predictable; register it from another sender first
    let predicted = derive_request_id(h.token_addr.as_str(), 1, mock_env().block.height);
    coordinator::contract::execute(
        h.coordinator.as_mut(),
        env_at(&h.coordinator_addr, ROUND_999_AT),
        message_info(&mallory, &[coin(100, FEE_DENOM)]),
        coordinator::msg::ExecuteMsg::RequestRandomness {
            request_id: predicted.clone(),
        },
    )
    .unwrap();

    let close_res = h
        .token_exec(&alice, ROUND_999_AT, token::msg::ExecuteMsg::CloseRound {})
        .unwrap();
    let request_id = attr(&close_res, "request_id");
    assert_eq!(request_id, predicted);
    h.forward_request(&close_res, ROUND_999_AT).unwrap();

    // The callback goes to the token, which settles the round
    let fulfill_res = h.relay_beacon(&request_id, ROUND_999_AT + 3);
    h.deliver_callback(&fulfill_res, ROUND_999_AT + 3).unwrap();
    assert_eq!(h.recent_winner(), Some(alice.clone()));
    assert_eq!(h.round().status, RoundStatus::Idle);

    let res = coordinator::contract::query(
        h.coordinator.as_ref(),
        env_at(&h.coordinator_addr, ROUND_999_AT),
        coordinator::msg::QueryMsg::Request {
            consumer: mallory.to_string(),
            request_id,
        },
    )
    .unwrap();
    let theirs: Option<coordinator::state::PendingRequest> = from_json(res).unwrap();
    let theirs = theirs.unwrap();
    assert_eq!(theirs.consumer, mallory);
    assert!(!theirs.fulfilled);
}
