//! contract::interface
//!
//! Calldata, return data, and log layouts of the goal contract.
//!
//! Both backends and the HTTP test fixtures share these, so an encoding
//! mismatch shows up in unit tests instead of against a live node.

use super::abi::{self, AbiError, ParamType, Token, Word};
use super::traits::GoalEvent;
use crate::core::goal::{CreateGoalRequest, Goal};
use crate::core::types::{Address, GoalId, Nonce, Wei};

pub const CREATE_GOAL: &str = "createGoal(string,address[],string[],uint256)";
pub const APPROVE_GOAL: &str = "approveGoal(bytes32)";
pub const ACHIEVE_MILESTONE: &str = "achieveMilestone(bytes32,uint256)";
pub const GET_GOAL_DETAILS: &str = "getGoalDetails(bytes32)";
pub const USER_GOAL_NONCE: &str = "userGoalNonce(address)";

pub const MILESTONE_ACHIEVED_EVENT: &str = "MilestoneAchieved(bytes32,uint256)";
pub const GOAL_APPROVED_EVENT: &str = "GoalApproved(bytes32,address)";

/// Calldata for `createGoal`. The stake travels as the transaction value.
pub fn encode_create_goal(request: &CreateGoalRequest) -> Vec<u8> {
    abi::encode_call(
        CREATE_GOAL,
        &[
            Token::String(request.description.clone()),
            Token::Array(request.judges.iter().copied().map(Token::Address).collect()),
            Token::Array(request.milestones.iter().cloned().map(Token::String).collect()),
            Token::uint(u128::from(request.required_approvals)),
        ],
    )
}

pub fn encode_approve_goal(goal_id: &GoalId) -> Vec<u8> {
    abi::encode_call(APPROVE_GOAL, &[Token::FixedBytes32(*goal_id.as_bytes())])
}

pub fn encode_achieve_milestone(goal_id: &GoalId, index: u64) -> Vec<u8> {
    abi::encode_call(
        ACHIEVE_MILESTONE,
        &[
            Token::FixedBytes32(*goal_id.as_bytes()),
            Token::uint(u128::from(index)),
        ],
    )
}

pub fn encode_get_goal_details(goal_id: &GoalId) -> Vec<u8> {
    abi::encode_call(GET_GOAL_DETAILS, &[Token::FixedBytes32(*goal_id.as_bytes())])
}

pub fn encode_user_goal_nonce(owner: &Address) -> Vec<u8> {
    abi::encode_call(USER_GOAL_NONCE, &[Token::Address(*owner)])
}

fn goal_fields() -> Vec<ParamType> {
    vec![
        ParamType::Address,
        ParamType::String,
        ParamType::Uint,
        ParamType::Array(Box::new(ParamType::Address)),
        ParamType::Uint,
        ParamType::Uint,
        ParamType::Array(Box::new(ParamType::Bool)),
        ParamType::Array(Box::new(ParamType::String)),
        ParamType::Array(Box::new(ParamType::Bool)),
        ParamType::Bool,
        ParamType::Bool,
    ]
}

fn goal_tokens(goal: &Goal) -> Vec<Token> {
    vec![
        Token::Address(goal.owner),
        Token::String(goal.description.clone()),
        Token::uint(goal.stake.as_u128()),
        Token::Array(goal.judges.iter().copied().map(Token::Address).collect()),
        Token::uint(u128::from(goal.required_approvals)),
        Token::uint(u128::from(goal.current_approvals)),
        Token::Array(goal.verified_approvals.iter().copied().map(Token::Bool).collect()),
        Token::Array(
            goal.milestone_descriptions
                .iter()
                .cloned()
                .map(Token::String)
                .collect(),
        ),
        Token::Array(goal.milestone_achieved.iter().copied().map(Token::Bool).collect()),
        Token::Bool(goal.completed),
        Token::Bool(goal.funds_released),
    ]
}

/// Return data for `getGoalDetails`, as a contract returning a single
/// struct would encode it.
pub fn encode_goal_details(goal: &Goal) -> Vec<u8> {
    abi::encode(&[Token::Tuple(goal_tokens(goal))])
}

/// Decode `getGoalDetails` return data.
///
/// Accepts both a single tuple return (leading `0x20` offset) and the same
/// fields returned as separate outputs. The first word of the flat layout
/// is the owner address, which is never `0x20` for a real account.
pub fn decode_goal_details(data: &[u8]) -> Result<Goal, AbiError> {
    let first = abi::read_word(data, 0)?;
    let tokens = if abi::word_to_u64(&first) == Ok(0x20) {
        let outer = abi::decode(&[ParamType::Tuple(goal_fields())], data)?;
        match outer.into_iter().next() {
            Some(tuple) => tuple.into_tuple()?,
            None => Vec::new(),
        }
    } else {
        abi::decode(&goal_fields(), data)?
    };

    let mut fields = tokens.into_iter();
    let mut next = || {
        fields.next().ok_or(AbiError::UnexpectedToken {
            expected: "goal field",
            found: "nothing",
        })
    };

    Ok(Goal {
        owner: next()?.into_address()?,
        description: next()?.into_string()?,
        stake: Wei::from_wei(next()?.into_u128()?),
        judges: addresses(next()?)?,
        required_approvals: next()?.into_u64()?,
        current_approvals: next()?.into_u64()?,
        verified_approvals: bools(next()?)?,
        milestone_descriptions: strings(next()?)?,
        milestone_achieved: bools(next()?)?,
        completed: next()?.into_bool()?,
        funds_released: next()?.into_bool()?,
    })
}

fn addresses(token: Token) -> Result<Vec<Address>, AbiError> {
    token.into_array()?.into_iter().map(Token::into_address).collect()
}

fn bools(token: Token) -> Result<Vec<bool>, AbiError> {
    token.into_array()?.into_iter().map(Token::into_bool).collect()
}

fn strings(token: Token) -> Result<Vec<String>, AbiError> {
    token.into_array()?.into_iter().map(Token::into_string).collect()
}

/// Decode `userGoalNonce` return data.
pub fn decode_nonce(data: &[u8]) -> Result<Nonce, AbiError> {
    let word = abi::read_word(data, 0)?;
    abi::word_to_u64(&word).map(Nonce::new)
}

pub fn milestone_achieved_topic() -> Word {
    abi::event_topic(MILESTONE_ACHIEVED_EVENT)
}

pub fn goal_approved_topic() -> Word {
    abi::event_topic(GOAL_APPROVED_EVENT)
}

/// Decode a log into a [`GoalEvent`].
///
/// Returns `Ok(None)` for logs with an unrelated topic. Parameters are
/// read from the indexed topics followed by the data words, so the result
/// does not depend on which parameters the contract marks `indexed`.
pub fn decode_event(topics: &[Word], data: &[u8], block_number: u64) -> Result<Option<GoalEvent>, AbiError> {
    let Some(topic0) = topics.first() else {
        return Ok(None);
    };

    let mut words: Vec<Word> = topics[1..].to_vec();
    let mut offset = 0;
    while offset + 32 <= data.len() {
        words.push(abi::read_word(data, offset)?);
        offset += 32;
    }

    let word = |i: usize| {
        words.get(i).copied().ok_or(AbiError::OutOfBounds {
            offset: i * 32,
            needed: 32,
            len: words.len() * 32,
        })
    };

    if *topic0 == milestone_achieved_topic() {
        Ok(Some(GoalEvent::MilestoneAchieved {
            goal_id: GoalId::from_bytes(word(0)?),
            milestone_index: abi::word_to_u64(&word(1)?)?,
            block_number,
        }))
    } else if *topic0 == goal_approved_topic() {
        Ok(Some(GoalEvent::GoalApproved {
            goal_id: GoalId::from_bytes(word(0)?),
            judge: abi::word_to_address(&word(1)?)?,
            block_number,
        }))
    } else {
        Ok(None)
    }
}

/// Topics and data for an event, with the goal id indexed.
pub fn encode_event(event: &GoalEvent) -> (Vec<Word>, Vec<u8>) {
    match event {
        GoalEvent::MilestoneAchieved {
            goal_id,
            milestone_index,
            ..
        } => (
            vec![milestone_achieved_topic(), *goal_id.as_bytes()],
            abi::uint_word(u128::from(*milestone_index)).to_vec(),
        ),
        GoalEvent::GoalApproved { goal_id, judge, .. } => (
            vec![goal_approved_topic(), *goal_id.as_bytes()],
            abi::address_word(judge).to_vec(),
        ),
    }
}
