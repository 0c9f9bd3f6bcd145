// Prize pool custody: entrance fees in, the whole pool out to the winner
use solana_program::{
    account_info::AccountInfo,
    msg,
    program::invoke,
    pubkey::Pubkey,
    system_instruction,
};

use crate::raffle_error::RaffleError;

/// Moves lamports into and out of the prize pool.
///
/// Implementations report failure instead of panicking. The caller only
/// clears its own pool accounting after `payout` returns `Ok`.
pub trait PayoutLedger {
    /// Accrue an entrance payment from `from` into the pool
    fn deposit(&mut self, from: &Pubkey, amount: u64) -> Result<(), RaffleError>;

    /// Transfer `amount` out of the pool to `recipient`
    fn payout(&mut self, recipient: &Pubkey, amount: u64) -> Result<(), RaffleError>;
}

/// Ledger backed by the raffle account's own lamports
pub struct VaultLedger<'a, 'b> {
    vault: &'b AccountInfo<'a>,
    counterparty: &'b AccountInfo<'a>,
    system_program: Option<&'b AccountInfo<'a>>,
    /// Lamports that must stay in the vault to keep it rent exempt
    reserve: u64,
}

impl<'a, 'b> VaultLedger<'a, 'b> {
    /// Ledger for an entry: `entrant` pays into `vault` through the system program
    pub fn for_entry(
        vault: &'b AccountInfo<'a>,
        entrant: &'b AccountInfo<'a>,
        system_program: &'b AccountInfo<'a>,
    ) -> Self {
        Self {
            vault,
            counterparty: entrant,
            system_program: Some(system_program),
            reserve: 0,
        }
    }

    /// Ledger for a payout: `vault` pays `winner`, never dipping below `reserve`
    pub fn for_payout(
        vault: &'b AccountInfo<'a>,
        winner: &'b AccountInfo<'a>,
        reserve: u64,
    ) -> Self {
        Self {
            vault,
            counterparty: winner,
            system_program: None,
            reserve,
        }
    }
}

impl<'a, 'b> PayoutLedger for VaultLedger<'a, 'b> {
    fn deposit(&mut self, from: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        let system_program = self.system_program.ok_or(RaffleError::DepositFailed)?;
        if self.counterparty.key != from {
            msg!("Deposit source {} does not match entrant {}", from, self.counterparty.key);
            return Err(RaffleError::DepositFailed);
        }
        if self.counterparty.lamports() < amount {
            msg!(
                "Entrant holds {} lamports, cannot pay {} lamports",
                self.counterparty.lamports(),
                amount
            );
            return Err(RaffleError::DepositFailed);
        }

        invoke(
            &system_instruction::transfer(from, self.vault.key, amount),
            &[
                self.counterparty.clone(),
                self.vault.clone(),
                system_program.clone(),
            ],
        )
        .map_err(|err| {
            msg!("Entrance fee transfer failed: {}", err);
            RaffleError::DepositFailed
        })
    }

    fn payout(&mut self, recipient: &Pubkey, amount: u64) -> Result<(), RaffleError> {
        if self.counterparty.key != recipient {
            msg!(
                "Winner account {} does not match selected winner {}",
                self.counterparty.key,
                recipient
            );
            return Err(RaffleError::PayoutFailed);
        }
        if !self.counterparty.is_writable {
            msg!("Winner account must be writable");
            return Err(RaffleError::PayoutFailed);
        }

        let available = self.vault.lamports().saturating_sub(self.reserve);
        if available < amount {
            msg!(
                "Insufficient pool balance: needed {} lamports, had {} lamports",
                amount,
                available
            );
            return Err(RaffleError::PayoutFailed);
        }

        let vault_balance = self.vault.lamports() - amount;
        let winner_balance = self
            .counterparty
            .lamports()
            .checked_add(amount)
            .ok_or(RaffleError::PayoutFailed)?;

        **self
            .vault
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::PayoutFailed)? = vault_balance;
        **self
            .counterparty
            .try_borrow_mut_lamports()
            .map_err(|_| RaffleError::PayoutFailed)? = winner_balance;

        msg!("Paid {} lamports to {}", amount, recipient);
        Ok(())
    }
}
