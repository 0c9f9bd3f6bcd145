use crate::payout::VaultLedger;
use crate::raffle_error::RaffleError;
use crate::raffle_events::{FulfillmentIgnored, RaffleEvent};
use crate::raffle_instruction::RaffleInstruction;
use crate::raffle_state::{Raffle, RaffleConfig};
use crate::vrf::CoordinatorQueue;

use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::set_return_data,
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_program,
    sysvar::{clock::Clock, rent::Rent, Sysvar},
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::InitializeRaffle {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                callback_gas_limit,
            } => {
                msg!("Instruction: Initialize Raffle");
                Self::process_initialize_raffle(
                    accounts,
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                    program_id,
                )
            }
            RaffleInstruction::EnterRaffle { payment } => {
                msg!("Instruction: Enter Raffle");
                Self::process_enter_raffle(accounts, payment, program_id)
            }
            RaffleInstruction::CheckUpkeep {} => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(accounts, program_id)
            }
            RaffleInstruction::PerformUpkeep {} => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(accounts, program_id)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(accounts, request_id, &random_words, program_id)
            }
            RaffleInstruction::ReissueRandomnessRequest {} => {
                msg!("Instruction: Reissue Randomness Request");
                Self::process_reissue_randomness_request(accounts, program_id)
            }
        }
    }

    /// Load an initialized raffle owned by this program
    fn load_raffle(raffle_info: &AccountInfo, program_id: &Pubkey) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }
        let raffle = Raffle::unpack(&raffle_info.data.borrow())?;
        Ok(raffle)
    }

    fn store_raffle(raffle: Raffle, raffle_info: &AccountInfo) -> ProgramResult {
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())
    }

    #[allow(clippy::too_many_arguments)]
    fn process_initialize_raffle(
        accounts: &[AccountInfo],
        entrance_fee: u64,
        interval: u64,
        key_hash: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_info = next_account_info(account_info_iter)?;

        if !admin_info.is_signer {
            msg!("Admin must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        if raffle_info.data_len() != Raffle::LEN {
            msg!("Raffle account must hold exactly {} bytes", Raffle::LEN);
            return Err(ProgramError::InvalidAccountData);
        }

        let existing = Raffle::unpack_unchecked(&raffle_info.data.borrow())?;
        if existing.is_initialized {
            msg!("Raffle account is already initialized");
            return Err(RaffleError::AlreadyInitialized.into());
        }

        let config = RaffleConfig {
            entrance_fee,
            interval,
            coordinator: *coordinator_info.key,
            key_hash,
            subscription_id,
            callback_gas_limit,
        };
        let rent = Rent::get()?;
        if !config.validate(&rent) {
            msg!(
                "Entrance fee must be at least {} lamports",
                RaffleConfig::min_entrance_fee(&rent)
            );
            return Err(RaffleError::InvalidConfig.into());
        }

        let clock = Clock::get()?;
        let raffle = Raffle::new(*admin_info.key, config, clock.unix_timestamp);
        Self::store_raffle(raffle, raffle_info)?;

        msg!(
            "Raffle initialized: EntranceFee={}, Interval={}s, Coordinator={}",
            entrance_fee,
            interval,
            coordinator_info.key
        );
        Ok(())
    }

    fn process_enter_raffle(
        accounts: &[AccountInfo],
        payment: u64,
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let entrant_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !entrant_info.is_signer {
            msg!("Entrant must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if *system_program_info.key != system_program::id() {
            return Err(ProgramError::IncorrectProgramId);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        let mut ledger = VaultLedger::for_entry(raffle_info, entrant_info, system_program_info);
        let event = raffle.enter(*entrant_info.key, payment, &mut ledger)?;

        Self::store_raffle(raffle, raffle_info)?;
        event.emit();
        Ok(())
    }

    fn process_check_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(raffle_info, program_id)?;
        let clock = Clock::get()?;
        let check = raffle.check_upkeep(clock.unix_timestamp);

        msg!(
            "Upkeep needed: {} (open={}, time_passed={}, players={}, balance={})",
            check.upkeep_needed,
            check.is_open,
            check.time_passed,
            check.player_count,
            check.pool_balance
        );

        let data = check
            .try_to_vec()
            .map_err(|err| ProgramError::BorshIoError(err.to_string()))?;
        set_return_data(&data);
        Ok(())
    }

    fn process_perform_upkeep(accounts: &[AccountInfo], program_id: &Pubkey) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        // Anyone can perform upkeep, eligibility is re-checked by the raffle
        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;
        let clock = Clock::get()?;

        let mut queue = CoordinatorQueue::new(raffle.config.coordinator, raffle.next_request_id);
        let event = raffle.perform_upkeep(clock.unix_timestamp, &mut queue)?;
        raffle.next_request_id = queue.next_request_id();

        Self::store_raffle(raffle, raffle_info)?;
        event.emit();
        Ok(())
    }

    fn process_fulfill_random_words(
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[u64],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let coordinator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        if !coordinator_info.is_signer {
            msg!("Coordinator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        if *coordinator_info.key != raffle.config.coordinator {
            msg!("Only coordinator {} can fulfill randomness", raffle.config.coordinator);
            return Err(RaffleError::NotCoordinator.into());
        }

        let clock = Clock::get()?;
        let reserve = Rent::get()?.minimum_balance(raffle_info.data_len());
        let mut ledger = VaultLedger::for_payout(raffle_info, winner_info, reserve);

        let outcome = raffle.fulfill_random_words(
            request_id,
            random_words,
            clock.unix_timestamp,
            &mut ledger,
        );
        match outcome {
            Ok(event) => {
                Self::store_raffle(raffle, raffle_info)?;
                event.emit();
                Ok(())
            }
            // Rejected without failing the transaction so oracle retries stay healthy
            Err(RaffleError::UnrecognizedRequest) => {
                FulfillmentIgnored { request_id }.emit();
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn process_reissue_randomness_request(
        accounts: &[AccountInfo],
        program_id: &Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let admin_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        if !admin_info.is_signer {
            msg!("Admin must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(raffle_info, program_id)?;

        if raffle.admin != *admin_info.key {
            msg!("Only the raffle admin can reissue a randomness request");
            return Err(RaffleError::NotRaffleAdmin.into());
        }

        let mut queue = CoordinatorQueue::new(raffle.config.coordinator, raffle.next_request_id);
        let event = raffle.reissue_request(&mut queue)?;
        raffle.next_request_id = queue.next_request_id();

        Self::store_raffle(raffle, raffle_info)?;
        event.emit();
        Ok(())
    }
}
