// Automation seam: an external trigger polls eligibility and dispatches upkeep
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;

use crate::raffle_error::RaffleError;
use crate::raffle_state::Raffle;
use crate::vrf::RandomnessClient;

/// Result of an eligibility check. Only `upkeep_needed` matters for
/// correctness; the rest is diagnostics for keepers and operators.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpkeepCheck {
    pub upkeep_needed: bool,
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
    pub player_count: u32,
    pub pool_balance: u64,
    pub seconds_since_last_resolution: i64,
}

/// Something a trigger can drive
pub trait Upkeep {
    fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck;

    /// Returns the id of the randomness request that was issued
    fn perform_upkeep(&mut self, now: UnixTimestamp) -> Result<u64, RaffleError>;
}

/// A raffle paired with the client its upkeep requests randomness from
pub struct RaffleUpkeep<'r, C: RandomnessClient> {
    pub raffle: &'r mut Raffle,
    pub client: &'r mut C,
}

impl<'r, C: RandomnessClient> Upkeep for RaffleUpkeep<'r, C> {
    fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck {
        self.raffle.check_upkeep(now)
    }

    fn perform_upkeep(&mut self, now: UnixTimestamp) -> Result<u64, RaffleError> {
        self.raffle
            .perform_upkeep(now, &mut *self.client)
            .map(|event| event.request_id)
    }
}

/// External automation service.
///
/// Implementors decide when to poll; `poll` checks eligibility and only
/// dispatches upkeep when the target reports it is needed.
pub trait UpkeepTrigger {
    fn is_due(&self, now: UnixTimestamp) -> bool;

    fn record_poll(&mut self, now: UnixTimestamp);

    fn poll<U: Upkeep + ?Sized>(
        &mut self,
        target: &mut U,
        now: UnixTimestamp,
    ) -> Result<Option<u64>, RaffleError> {
        if !self.is_due(now) {
            return Ok(None);
        }
        self.record_poll(now);

        if !target.check_upkeep(now).upkeep_needed {
            return Ok(None);
        }
        target.perform_upkeep(now).map(Some)
    }
}

/// Polls at most once every `cadence` seconds
#[derive(Debug, Clone, Copy)]
pub struct CadenceTrigger {
    cadence: u64,
    last_poll: Option<UnixTimestamp>,
}

impl CadenceTrigger {
    pub fn new(cadence: u64) -> Self {
        Self {
            cadence,
            last_poll: None,
        }
    }

    pub fn last_poll(&self) -> Option<UnixTimestamp> {
        self.last_poll
    }
}

impl UpkeepTrigger for CadenceTrigger {
    fn is_due(&self, now: UnixTimestamp) -> bool {
        match self.last_poll {
            None => true,
            Some(last) => {
                let elapsed = now.saturating_sub(last);
                elapsed >= 0 && (elapsed as u64) >= self.cadence
            }
        }
    }

    fn record_poll(&mut self, now: UnixTimestamp) {
        self.last_poll = Some(now);
    }
}
