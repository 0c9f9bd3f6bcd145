use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;

use crate::raffle_error::RaffleError;

/// Most random words a single fulfillment may carry
pub const MAX_RANDOM_WORDS: usize = 8;

#[derive(Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Initialize a raffle account and open its first round
    ///
    /// Accounts expected:
    /// 0. `[signer]` The admin account
    /// 1. `[writable]` The raffle account, program owned and uninitialized
    /// 2. `[]` The randomness coordinator allowed to fulfill requests
    InitializeRaffle {
        /// Minimum payment in lamports
        entrance_fee: u64,
        /// Minimum seconds between resolutions
        interval: u64,
        /// Oracle key hash (gas lane)
        key_hash: [u8; 32],
        /// Oracle subscription paying for requests
        subscription_id: u64,
        /// Compute the oracle reserves for the callback
        callback_gas_limit: u32,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The entrant (pays the entrance fee)
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    EnterRaffle {
        /// Lamports paid, at least the entrance fee
        payment: u64,
    },

    /// Evaluate eligibility; the result is returned as borsh-encoded `UpkeepCheck` return data
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep {},

    /// Request randomness for an eligible round
    ///
    /// Accounts expected:
    /// 0. `[signer]` Any user (the automation service has no special privilege)
    /// 1. `[writable]` The raffle account
    PerformUpkeep {},

    /// Deliver randomness for the pending request and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The configured randomness coordinator
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The prize recipient (selected winner)
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<u64>,
    },

    /// Replace a pending randomness request that was never answered (admin only)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The raffle admin
    /// 1. `[writable]` The raffle account
    ReissueRandomnessRequest {},
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (&tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstructionData)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (interval, rest) = Self::unpack_u64(rest)?;
                let (key_hash, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, _) = Self::unpack_u32(rest)?;
                Self::InitializeRaffle {
                    entrance_fee,
                    interval,
                    key_hash,
                    subscription_id,
                    callback_gas_limit,
                }
            }
            1 => {
                let (payment, _) = Self::unpack_u64(rest)?;
                Self::EnterRaffle { payment }
            }
            2 => Self::CheckUpkeep {},
            3 => Self::PerformUpkeep {},
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (&count, mut rest) = rest
                    .split_first()
                    .ok_or(RaffleError::InvalidInstructionData)?;
                if count as usize > MAX_RANDOM_WORDS {
                    return Err(RaffleError::InvalidInstructionData.into());
                }
                let mut random_words = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let (word, next) = Self::unpack_u64(rest)?;
                    random_words.push(word);
                    rest = next;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            5 => Self::ReissueRandomnessRequest {},
            _ => return Err(RaffleError::InvalidInstructionData.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::InitializeRaffle {
                entrance_fee,
                interval,
                key_hash,
                subscription_id,
                callback_gas_limit,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
                buf.extend_from_slice(key_hash);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
            }
            Self::EnterRaffle { payment } => {
                buf.push(1);
                buf.extend_from_slice(&payment.to_le_bytes());
            }
            Self::CheckUpkeep {} => buf.push(2),
            Self::PerformUpkeep {} => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                // Only the first MAX_RANDOM_WORDS words are carried
                let count = random_words.len().min(MAX_RANDOM_WORDS);
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.push(count as u8);
                for word in &random_words[..count] {
                    buf.extend_from_slice(&word.to_le_bytes());
                }
            }
            Self::ReissueRandomnessRequest {} => buf.push(5),
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let value = input
            .get(..8)
            .and_then(|slice| slice.try_into().ok())
            .map(u64::from_le_bytes)
            .ok_or(RaffleError::InvalidInstructionData)?;
        Ok((value, &input[8..]))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let value = input
            .get(..4)
            .and_then(|slice| slice.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or(RaffleError::InvalidInstructionData)?;
        Ok((value, &input[4..]))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        let value: [u8; N] = input
            .get(..N)
            .and_then(|slice| slice.try_into().ok())
            .ok_or(RaffleError::InvalidInstructionData)?;
        Ok((value, &input[N..]))
    }
}

/// Create initialize_raffle instruction
pub fn initialize_raffle(
    program_id: &Pubkey,
    admin: &Pubkey,
    raffle_account: &Pubkey,
    coordinator: &Pubkey,
    entrance_fee: u64,
    interval: u64,
    key_hash: [u8; 32],
    subscription_id: u64,
    callback_gas_limit: u32,
) -> Instruction {
    let data = RaffleInstruction::InitializeRaffle {
        entrance_fee,
        interval,
        key_hash,
        subscription_id,
        callback_gas_limit,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*admin, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(*coordinator, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create enter_raffle instruction
pub fn enter_raffle(
    program_id: &Pubkey,
    entrant: &Pubkey,
    raffle_account: &Pubkey,
    payment: u64,
) -> Instruction {
    let data = RaffleInstruction::EnterRaffle { payment }.pack();

    let accounts = vec![
        AccountMeta::new(*entrant, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle_account: &Pubkey) -> Instruction {
    Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle_account, false)],
        data: RaffleInstruction::CheckUpkeep {}.pack(),
    }
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle_account: &Pubkey,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*raffle_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::PerformUpkeep {}.pack(),
    }
}

/// Create fulfill_random_words instruction
pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator: &Pubkey,
    raffle_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    random_words: Vec<u64>,
) -> Instruction {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack();

    let accounts = vec![
        AccountMeta::new_readonly(*coordinator, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new(*winner, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}

/// Create reissue_randomness_request instruction
pub fn reissue_randomness_request(
    program_id: &Pubkey,
    admin: &Pubkey,
    raffle_account: &Pubkey,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new_readonly(*admin, true),
        AccountMeta::new(*raffle_account, false),
    ];

    Instruction {
        program_id: *program_id,
        accounts,
        data: RaffleInstruction::ReissueRandomnessRequest {}.pack(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_rejects_truncated_and_unknown_data() {
        assert!(RaffleInstruction::unpack(&[]).is_err());
        assert!(RaffleInstruction::unpack(&[1, 0, 0]).is_err());
        assert!(RaffleInstruction::unpack(&[42]).is_err());
        // Declares two words but carries one
        let mut data = vec![4];
        data.extend_from_slice(&9u64.to_le_bytes());
        data.push(2);
        data.extend_from_slice(&7u64.to_le_bytes());
        assert_eq!(
            RaffleInstruction::unpack(&data),
            Err(ProgramError::Custom(RaffleError::InvalidInstructionData as u32))
        );
    }

    #[test]
    fn test_fulfill_random_words_caps_word_count() {
        let random_words: Vec<u64> = (0..300).collect();
        let data = RaffleInstruction::FulfillRandomWords {
            request_id: 5,
            random_words,
        }
        .pack();

        assert_eq!(data.len(), 1 + 8 + 1 + 8 * MAX_RANDOM_WORDS);
        assert_eq!(
            RaffleInstruction::unpack(&data).unwrap(),
            RaffleInstruction::FulfillRandomWords {
                request_id: 5,
                random_words: (0..MAX_RANDOM_WORDS as u64).collect(),
            }
        );
    }

    #[test]
    fn test_fulfill_random_words_wire_format() {
        let data = RaffleInstruction::FulfillRandomWords {
            request_id: 3,
            random_words: vec![10],
        }
        .pack();

        assert_eq!(data.len(), 1 + 8 + 1 + 8);
        assert_eq!(data[0], 4);
        assert_eq!(
            RaffleInstruction::unpack(&data).unwrap(),
            RaffleInstruction::FulfillRandomWords {
                request_id: 3,
                random_words: vec![10],
            }
        );
    }
}
