// Structured events, logged as `[discriminator, borsh(event)]` through sol_log_data
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

pub trait RaffleEvent: BorshSerialize {
    const DISCRIMINATOR: [u8; 8];

    fn emit(&self) {
        match self.try_to_vec() {
            Ok(data) => sol_log_data(&[Self::DISCRIMINATOR.as_ref(), data.as_slice()]),
            Err(err) => msg!("Failed to serialize event: {}", err),
        }
    }
}

/// A player joined the current round
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct RaffleEntered {
    pub player: Pubkey,
    pub amount: u64,
    pub player_count: u32,
}

impl RaffleEvent for RaffleEntered {
    const DISCRIMINATOR: [u8; 8] = *b"entered\0";
}

/// Upkeep moved the round into the calculating phase
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct RequestedRaffleWinner {
    pub request_id: u64,
}

impl RaffleEvent for RequestedRaffleWinner {
    const DISCRIMINATOR: [u8; 8] = *b"reqwinnr";
}

/// Request published for the off-chain coordinator
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct RandomWordsRequested {
    pub request_id: u64,
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl RaffleEvent for RandomWordsRequested {
    const DISCRIMINATOR: [u8; 8] = *b"randreqd";
}

/// The round resolved and the pool went to the winner
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct WinnerPicked {
    pub request_id: u64,
    pub winner: Pubkey,
    pub amount: u64,
    pub winner_index: u32,
}

impl RaffleEvent for WinnerPicked {
    const DISCRIMINATOR: [u8; 8] = *b"winnerpk";
}

/// A fulfillment was dropped because its request id is not pending
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentIgnored {
    pub request_id: u64,
}

impl RaffleEvent for FulfillmentIgnored {
    const DISCRIMINATOR: [u8; 8] = *b"fulfign\0";
}
