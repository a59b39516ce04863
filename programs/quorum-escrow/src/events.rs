use anchor_lang::prelude::*;
use crate::state::Vote;

#[event]
pub struct EscrowCreated {
    pub reference_id: [u8; 32],
    pub owner: Pubkey,
    pub amount: u64,
    pub recipient: Pubkey,
    pub agent: Pubkey,
    pub slot: u64,
}

#[event]
pub struct EscrowFunded {
    pub reference_id: [u8; 32],
    pub funder: Pubkey,
    pub amount: u64,
    pub invested: bool,
}

#[event]
pub struct DecisionCast {
    pub reference_id: [u8; 32],
    pub voter: Pubkey,
    pub vote: Vote,
    pub release_votes: u8,
    pub revert_votes: u8,
}

/// Emitted when the tally reaches one release and one revert.
#[event]
pub struct DisputeRaised {
    pub reference_id: [u8; 32],
    pub slot: u64,
}

/// Emitted when a party flags a dispute outside the tally.
#[event]
pub struct DisputeEscalated {
    pub reference_id: [u8; 32],
    pub caller: Pubkey,
    pub party: Pubkey,
    pub slot: u64,
}

#[event]
pub struct EscrowFinalized {
    pub reference_id: [u8; 32],
    pub winner: Pubkey,
}

#[event]
pub struct FundsWithdrawn {
    pub reference_id: [u8; 32],
    pub owner: Pubkey,
    pub amount: u64,
    pub remaining: u64,
    pub slot: u64,
}

#[event]
pub struct YieldQuoted {
    pub reference_id: [u8; 32],
    pub yield_program: Pubkey,
    pub exchange_rate: u128,
    pub supply_rate: u128,
}
