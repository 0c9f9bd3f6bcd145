use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
    rent::Rent,
};
use std::convert::TryFrom;

/// Maximum number of entries a single round can hold
pub const MAX_PLAYERS: usize = 100;

const PLAYERS_LEN: usize = 32 * MAX_PLAYERS;

/// Phase of the current round
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundState {
    /// Accepting entries
    Open,
    /// A randomness request is outstanding
    Calculating,
}

impl TryFrom<u8> for RoundState {
    type Error = &'static str;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RoundState::Open),
            1 => Ok(RoundState::Calculating),
            _ => Err("Invalid round state"),
        }
    }
}

impl From<RoundState> for u8 {
    fn from(state: RoundState) -> Self {
        match state {
            RoundState::Open => 0,
            RoundState::Calculating => 1,
        }
    }
}

/// Deployment parameters, fixed once the raffle is initialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Minimum payment in lamports to enter a round
    pub entrance_fee: u64,
    /// Minimum seconds between two resolutions
    pub interval: u64,
    /// Only identity allowed to deliver randomness
    pub coordinator: Pubkey,
    /// Oracle key hash (gas lane), passed through untouched
    pub key_hash: [u8; 32],
    /// Oracle subscription funding the requests
    pub subscription_id: u64,
    /// Compute budget the oracle should reserve for the callback
    pub callback_gas_limit: u32,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        // Development values
        // Entrance fee: 0.01 SOL = 10,000,000 lamports
        // Interval: 30 seconds
        Self {
            entrance_fee: 10_000_000,
            interval: 30,
            coordinator: Pubkey::default(),
            key_hash: [0u8; 32],
            subscription_id: 0,
            callback_gas_limit: 500_000,
        }
    }
}

impl RaffleConfig {
    /// Smallest entrance fee `rent` allows. A round's pool must be able to
    /// bring an empty winner account to the rent-exempt minimum on its own.
    pub fn min_entrance_fee(rent: &Rent) -> u64 {
        rent.minimum_balance(0).max(1)
    }

    pub fn validate(&self, rent: &Rent) -> bool {
        self.entrance_fee >= Self::min_entrance_fee(rent)
    }
}

/// The unit of play, reset in place after every payout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    pub state: RoundState,
    /// Entrants in entry order
    pub players: Vec<Pubkey>,
    /// Lamports accumulated for this round
    pub pool_balance: u64,
    /// Time of the last successful resolution (or of initialization)
    pub last_timestamp: UnixTimestamp,
    pub pending_request_id: Option<u64>,
}

impl Round {
    pub fn new(now: UnixTimestamp) -> Self {
        Self {
            state: RoundState::Open,
            players: Vec::new(),
            pool_balance: 0,
            last_timestamp: now,
            pending_request_id: None,
        }
    }
}

/// Raffle account data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// May reissue a stuck randomness request
    pub admin: Pubkey,
    pub config: RaffleConfig,
    pub round: Round,
    /// Next request id handed out by the coordinator queue
    pub next_request_id: u64,
    /// Winner of the last resolved round
    pub recent_winner: Option<Pubkey>,
}

impl Raffle {
    pub fn new(admin: Pubkey, config: RaffleConfig, now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            admin,
            config,
            round: Round::new(now),
            next_request_id: 1,
            recent_winner: None,
        }
    }

    pub fn entrance_fee(&self) -> u64 {
        self.config.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.config.interval
    }

    pub fn state(&self) -> RoundState {
        self.round.state
    }

    pub fn num_players(&self) -> usize {
        self.round.players.len()
    }

    pub fn player(&self, index: usize) -> Option<Pubkey> {
        self.round.players.get(index).copied()
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.round.last_timestamp
    }

    pub fn pending_request_id(&self) -> Option<u64> {
        self.round.pending_request_id
    }

    pub fn pool_balance(&self) -> u64 {
        self.round.pool_balance
    }

    pub fn request_confirmations(&self) -> u16 {
        crate::vrf::REQUEST_CONFIRMATIONS
    }

    pub fn num_words(&self) -> u32 {
        crate::vrf::NUM_WORDS
    }
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Raffle {
    const LEN: usize =
        1 + 32 + 32 + 8 + 8 + 32 + 8 + 4 + 1 + 1 + 8 + 8 + 8 + 8 + 1 + 32 + 4 + PLAYERS_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Raffle::LEN];
        let (
            is_initialized,
            admin,
            coordinator,
            entrance_fee,
            interval,
            key_hash,
            subscription_id,
            callback_gas_limit,
            state,
            has_pending,
            pending_request_id,
            next_request_id,
            pool_balance,
            last_timestamp,
            has_winner,
            recent_winner,
            player_count,
            players,
        ) = array_refs![
            src, 1, 32, 32, 8, 8, 32, 8, 4, 1, 1, 8, 8, 8, 8, 1, 32, 4, PLAYERS_LEN
        ];

        let state = RoundState::try_from(state[0]).map_err(|_| ProgramError::InvalidAccountData)?;
        let pending_request_id = match has_pending[0] {
            0 => None,
            1 => Some(u64::from_le_bytes(*pending_request_id)),
            _ => return Err(ProgramError::InvalidAccountData),
        };
        // Open exactly when nothing is in flight
        if (state == RoundState::Open) != pending_request_id.is_none() {
            return Err(ProgramError::InvalidAccountData);
        }

        let player_count = u32::from_le_bytes(*player_count) as usize;
        if player_count > MAX_PLAYERS {
            return Err(ProgramError::InvalidAccountData);
        }
        let players = players
            .chunks_exact(32)
            .take(player_count)
            .map(|chunk| Pubkey::new_from_array(*array_ref![chunk, 0, 32]))
            .collect();

        Ok(Raffle {
            is_initialized: is_initialized[0] != 0,
            admin: Pubkey::new_from_array(*admin),
            config: RaffleConfig {
                entrance_fee: u64::from_le_bytes(*entrance_fee),
                interval: u64::from_le_bytes(*interval),
                coordinator: Pubkey::new_from_array(*coordinator),
                key_hash: *key_hash,
                subscription_id: u64::from_le_bytes(*subscription_id),
                callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            },
            round: Round {
                state,
                players,
                pool_balance: u64::from_le_bytes(*pool_balance),
                last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
                pending_request_id,
            },
            next_request_id: u64::from_le_bytes(*next_request_id),
            recent_winner: if has_winner[0] != 0 {
                Some(Pubkey::new_from_array(*recent_winner))
            } else {
                None
            },
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Raffle::LEN];
        let (
            is_initialized_dst,
            admin_dst,
            coordinator_dst,
            entrance_fee_dst,
            interval_dst,
            key_hash_dst,
            subscription_id_dst,
            callback_gas_limit_dst,
            state_dst,
            has_pending_dst,
            pending_request_id_dst,
            next_request_id_dst,
            pool_balance_dst,
            last_timestamp_dst,
            has_winner_dst,
            recent_winner_dst,
            player_count_dst,
            players_dst,
        ) = mut_array_refs![
            dst, 1, 32, 32, 8, 8, 32, 8, 4, 1, 1, 8, 8, 8, 8, 1, 32, 4, PLAYERS_LEN
        ];

        is_initialized_dst[0] = self.is_initialized as u8;
        admin_dst.copy_from_slice(self.admin.as_ref());
        coordinator_dst.copy_from_slice(self.config.coordinator.as_ref());
        *entrance_fee_dst = self.config.entrance_fee.to_le_bytes();
        *interval_dst = self.config.interval.to_le_bytes();
        *key_hash_dst = self.config.key_hash;
        *subscription_id_dst = self.config.subscription_id.to_le_bytes();
        *callback_gas_limit_dst = self.config.callback_gas_limit.to_le_bytes();
        state_dst[0] = self.round.state.into();
        has_pending_dst[0] = self.round.pending_request_id.is_some() as u8;
        *pending_request_id_dst = self.round.pending_request_id.unwrap_or(0).to_le_bytes();
        *next_request_id_dst = self.next_request_id.to_le_bytes();
        *pool_balance_dst = self.round.pool_balance.to_le_bytes();
        *last_timestamp_dst = self.round.last_timestamp.to_le_bytes();
        has_winner_dst[0] = self.recent_winner.is_some() as u8;
        recent_winner_dst.copy_from_slice(self.recent_winner.unwrap_or_default().as_ref());
        *player_count_dst = (self.round.players.len() as u32).to_le_bytes();

        // Slots past the player count are zeroed so a reset round leaves no stale keys
        players_dst.fill(0);
        for (slot, player) in players_dst.chunks_exact_mut(32).zip(self.round.players.iter()) {
            slot.copy_from_slice(player.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_preserves_player_order_and_pending_request() {
        let mut raffle = Raffle::new(Pubkey::new_unique(), RaffleConfig::default(), 1_000);
        let players: Vec<Pubkey> = (0..4).map(|_| Pubkey::new_unique()).collect();
        raffle.round.players = players.clone();
        raffle.round.pool_balance = 40_000_000;
        raffle.round.state = RoundState::Calculating;
        raffle.round.pending_request_id = Some(7);
        raffle.next_request_id = 8;

        let mut data = vec![0u8; Raffle::LEN];
        Raffle::pack(raffle.clone(), &mut data).unwrap();
        let unpacked = Raffle::unpack(&data).unwrap();

        assert_eq!(unpacked, raffle);
        assert_eq!(unpacked.player(2), Some(players[2]));
    }

    #[test]
    fn test_validate_requires_rent_exempt_entrance_fee() {
        let rent = Rent::default();
        let minimum = rent.minimum_balance(0);
        let config = |entrance_fee| RaffleConfig {
            entrance_fee,
            ..RaffleConfig::default()
        };

        assert!(!config(0).validate(&rent));
        assert!(!config(minimum - 1).validate(&rent));
        assert!(config(minimum).validate(&rent));
        assert!(RaffleConfig::default().validate(&rent));

        // A rent-free cluster still refuses a zero fee
        let free = Rent {
            lamports_per_byte_year: 0,
            ..Rent::default()
        };
        assert!(!config(0).validate(&free));
        assert!(config(1).validate(&free));
    }

    #[test]
    fn test_unpack_rejects_open_round_with_pending_request() {
        let mut raffle = Raffle::new(Pubkey::new_unique(), RaffleConfig::default(), 0);
        raffle.round.pending_request_id = Some(1);

        let mut data = vec![0u8; Raffle::LEN];
        raffle.pack_into_slice(&mut data);

        assert_eq!(
            Raffle::unpack_from_slice(&data),
            Err(ProgramError::InvalidAccountData)
        );
    }
}
