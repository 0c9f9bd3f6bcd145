use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstructionData,

    /// Raffle configuration rejected at initialization
    #[error("Invalid raffle configuration")]
    InvalidConfig,

    /// Raffle account is already in use
    #[error("Raffle account is already initialized")]
    AlreadyInitialized,

    /// Payment is below the entrance fee
    #[error("Payment is below the entrance fee")]
    InsufficientPayment,

    /// Entry attempted while the round is not open
    #[error("Raffle round is not open")]
    RoundNotOpen,

    /// No space left for another player
    #[error("Raffle is full")]
    RaffleFull,

    /// Entrance fee could not be moved into the pool
    #[error("Deposit into the prize pool failed")]
    DepositFailed,

    /// Upkeep attempted while the round is not eligible
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Fulfillment for an unknown or stale request id
    #[error("Unrecognized randomness request")]
    UnrecognizedRequest,

    /// Fulfillment carried no random words
    #[error("Fulfillment carried no random words")]
    MissingRandomWords,

    /// Transfer of the pool to the winner did not succeed
    #[error("Payout to the winner failed")]
    PayoutFailed,

    /// Only the configured coordinator may fulfill randomness
    #[error("Only the randomness coordinator can fulfill requests")]
    NotCoordinator,

    /// Only the raffle admin can perform this action
    #[error("Only the raffle admin can perform this action")]
    NotRaffleAdmin,

    /// No randomness request is outstanding
    #[error("No randomness request is pending")]
    NoPendingRequest,

    /// Arithmetic overflow on a balance or counter
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
