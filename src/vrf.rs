// Randomness oracle integration for the raffle program
use solana_program::{msg, pubkey::Pubkey};

use crate::raffle_error::RaffleError;
use crate::raffle_events::{RaffleEvent, RandomWordsRequested};
use crate::raffle_state::RaffleConfig;

/// Block confirmations the oracle waits before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;
/// Random words asked for per request
pub const NUM_WORDS: u32 = 1;

/// Oracle parameters carried with every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VrfParams {
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl From<&RaffleConfig> for VrfParams {
    fn from(config: &RaffleConfig) -> Self {
        Self {
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit: config.callback_gas_limit,
            num_words: NUM_WORDS,
        }
    }
}

/// Submits randomness requests. The value itself arrives later through a
/// separate fulfillment, never as a return value.
pub trait RandomnessClient {
    /// Returns the id the oracle will answer with. Ids are never reused.
    fn request_random_words(&mut self, params: &VrfParams) -> Result<u64, RaffleError>;
}

/// On-chain client: hands out ids from the sequence stored in the raffle
/// account and publishes each request for the coordinator identified by
/// `coordinator`.
pub struct CoordinatorQueue {
    coordinator: Pubkey,
    next_request_id: u64,
}

impl CoordinatorQueue {
    pub fn new(coordinator: Pubkey, next_request_id: u64) -> Self {
        Self {
            coordinator,
            next_request_id,
        }
    }

    /// Sequence value to persist back into the raffle account
    pub fn next_request_id(&self) -> u64 {
        self.next_request_id
    }
}

impl RandomnessClient for CoordinatorQueue {
    fn request_random_words(&mut self, params: &VrfParams) -> Result<u64, RaffleError> {
        let request_id = self.next_request_id;
        self.next_request_id = request_id
            .checked_add(1)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        RandomWordsRequested {
            request_id,
            key_hash: params.key_hash,
            subscription_id: params.subscription_id,
            request_confirmations: params.request_confirmations,
            callback_gas_limit: params.callback_gas_limit,
            num_words: params.num_words,
        }
        .emit();
        msg!(
            "Randomness request {} queued for coordinator {}",
            request_id,
            self.coordinator
        );
        Ok(request_id)
    }
}

/// Get a winner index from a random word.
///
/// Plain modulo: when `player_count` does not divide 2^64 evenly the lower
/// indices are very slightly favoured. Kept as is.
pub fn get_random_winner_index(random_word: u64, player_count: u64) -> u64 {
    if player_count == 0 {
        return 0;
    }

    random_word % player_count
}
