// AutoRaffle
// A self-running raffle: fixed entrance fee, automated upkeep and an
// asynchronous randomness oracle picking the winner of each round

// Raffle modules
pub mod raffle_error;
pub mod raffle_events;
pub mod raffle_instruction;
pub mod raffle_machine;
pub mod raffle_processor;
pub mod raffle_state;

// External collaborators: randomness oracle, prize custody, automation
pub mod payout;
pub mod upkeep;
pub mod vrf;

#[cfg(not(feature = "no-entrypoint"))]
pub mod raffle_entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    raffle_processor::Processor::process(program_id, accounts, instruction_data)
}
