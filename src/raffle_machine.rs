//! Round state machine.
//!
//! `OPEN --perform_upkeep--> CALCULATING --fulfill_random_words--> OPEN`.
//! A failed payout leaves the round in CALCULATING with its request still
//! pending. Every operation either applies all of its changes or none.

use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::payout::PayoutLedger;
use crate::raffle_error::RaffleError;
use crate::raffle_events::{RaffleEntered, RequestedRaffleWinner, WinnerPicked};
use crate::raffle_state::{Raffle, RoundState, MAX_PLAYERS};
use crate::upkeep::UpkeepCheck;
use crate::vrf::{get_random_winner_index, RandomnessClient, VrfParams};

impl Raffle {
    /// Add `participant` to the current round with `payment` lamports.
    pub fn enter<L: PayoutLedger + ?Sized>(
        &mut self,
        participant: Pubkey,
        payment: u64,
        ledger: &mut L,
    ) -> Result<RaffleEntered, RaffleError> {
        if payment < self.config.entrance_fee {
            msg!(
                "Payment of {} lamports is below the entrance fee of {} lamports",
                payment,
                self.config.entrance_fee
            );
            return Err(RaffleError::InsufficientPayment);
        }
        if self.round.state != RoundState::Open {
            msg!("Raffle is calculating a winner, entries are closed");
            return Err(RaffleError::RoundNotOpen);
        }
        if self.round.players.len() >= MAX_PLAYERS {
            msg!("Raffle already holds {} players", MAX_PLAYERS);
            return Err(RaffleError::RaffleFull);
        }
        let pool_balance = self
            .round
            .pool_balance
            .checked_add(payment)
            .ok_or(RaffleError::ArithmeticOverflow)?;

        ledger.deposit(&participant, payment)?;

        self.round.players.push(participant);
        self.round.pool_balance = pool_balance;

        msg!(
            "Player {} entered with {} lamports, pool is now {} lamports",
            participant,
            payment,
            pool_balance
        );
        Ok(RaffleEntered {
            player: participant,
            amount: payment,
            player_count: self.round.players.len() as u32,
        })
    }

    /// Side-effect free eligibility predicate with its diagnostics.
    pub fn check_upkeep(&self, now: UnixTimestamp) -> UpkeepCheck {
        let elapsed = now.saturating_sub(self.round.last_timestamp);
        let is_open = self.round.state == RoundState::Open;
        let time_passed = elapsed >= 0 && (elapsed as u64) >= self.config.interval;
        let has_players = !self.round.players.is_empty();
        let has_balance = self.round.pool_balance > 0;

        UpkeepCheck {
            upkeep_needed: is_open && time_passed && has_players && has_balance,
            is_open,
            time_passed,
            has_players,
            has_balance,
            player_count: self.round.players.len() as u32,
            pool_balance: self.round.pool_balance,
            seconds_since_last_resolution: elapsed,
        }
    }

    /// Move an eligible round to CALCULATING and request its random word.
    ///
    /// Anyone may call this; eligibility is re-checked here, so redundant or
    /// premature triggers fail with `UpkeepNotNeeded` and change nothing.
    pub fn perform_upkeep<C: RandomnessClient + ?Sized>(
        &mut self,
        now: UnixTimestamp,
        client: &mut C,
    ) -> Result<RequestedRaffleWinner, RaffleError> {
        let check = self.check_upkeep(now);
        if !check.upkeep_needed {
            msg!(
                "Upkeep not needed: balance={}, players={}, state={:?}, open={}, time_passed={}",
                check.pool_balance,
                check.player_count,
                self.round.state,
                check.is_open,
                check.time_passed
            );
            return Err(RaffleError::UpkeepNotNeeded);
        }

        let request_id = client.request_random_words(&VrfParams::from(&self.config))?;
        self.round.state = RoundState::Calculating;
        self.round.pending_request_id = Some(request_id);

        msg!("Upkeep performed, randomness request {} pending", request_id);
        Ok(RequestedRaffleWinner { request_id })
    }

    /// Consume the oracle's answer for the pending request.
    ///
    /// A stale, replayed or foreign `request_id` yields `UnrecognizedRequest`
    /// with no state change. A failed payout yields `PayoutFailed` and the
    /// round keeps waiting on the same request.
    pub fn fulfill_random_words<L: PayoutLedger + ?Sized>(
        &mut self,
        request_id: u64,
        random_words: &[u64],
        now: UnixTimestamp,
        ledger: &mut L,
    ) -> Result<WinnerPicked, RaffleError> {
        if self.round.pending_request_id != Some(request_id) {
            msg!(
                "Ignoring fulfillment for request {}, pending request is {:?}",
                request_id,
                self.round.pending_request_id
            );
            return Err(RaffleError::UnrecognizedRequest);
        }
        let random_word = *random_words.first().ok_or(RaffleError::MissingRandomWords)?;

        let player_count = self.round.players.len() as u64;
        let winner_index = get_random_winner_index(random_word, player_count);
        let winner = self
            .round
            .players
            .get(winner_index as usize)
            .copied()
            .ok_or(RaffleError::PayoutFailed)?;
        let amount = self.round.pool_balance;

        if let Err(err) = ledger.payout(&winner, amount) {
            msg!(
                "Payout of {} lamports to {} failed, round {} stays calculating",
                amount,
                winner,
                request_id
            );
            return Err(err);
        }

        self.round.players.clear();
        self.round.pool_balance = 0;
        self.round.pending_request_id = None;
        self.round.last_timestamp = now;
        self.round.state = RoundState::Open;
        self.recent_winner = Some(winner);

        msg!(
            "Winner picked: {} (index {} of {}) received {} lamports",
            winner,
            winner_index,
            player_count,
            amount
        );
        Ok(WinnerPicked {
            request_id,
            winner,
            amount,
            winner_index: winner_index as u32,
        })
    }

    /// Replace the pending request with a fresh one.
    ///
    /// Recovery for a round whose oracle never answered. The old id becomes
    /// stale; players and pool are untouched.
    pub fn reissue_request<C: RandomnessClient + ?Sized>(
        &mut self,
        client: &mut C,
    ) -> Result<RequestedRaffleWinner, RaffleError> {
        let stale = match (self.round.state, self.round.pending_request_id) {
            (RoundState::Calculating, Some(id)) => id,
            _ => {
                msg!("No randomness request is pending");
                return Err(RaffleError::NoPendingRequest);
            }
        };

        let request_id = client.request_random_words(&VrfParams::from(&self.config))?;
        self.round.pending_request_id = Some(request_id);

        msg!("Randomness request {} replaced by {}", stale, request_id);
        Ok(RequestedRaffleWinner { request_id })
    }
}
