use anchor_lang::prelude::*;

use crate::error::EscrowError;

pub const ESCROW_SEED: &[u8] = b"escrow";
pub const NATIVE_VAULT_SEED: &[u8] = b"native_vault";
pub const SIGNER_COUNT: usize = 3;
/// Votes needed on one side to finalize a record.
pub const QUORUM: u8 = 2;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, InitSpace, PartialEq, Eq, Debug)]
pub enum TokenKind {
    #[default]
    Native,
    Fungible,
}

/// A signer's recorded decision. Only `Undecided` may change, and only once.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, InitSpace, PartialEq, Eq, Debug)]
pub enum Decision {
    #[default]
    Undecided,
    Release,
    Revert,
}

/// The choice a signer submits. Unlike `Decision` it cannot be `Undecided`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum Vote {
    Release,
    Revert,
}

impl From<Vote> for Decision {
    fn from(vote: Vote) -> Self {
        match vote {
            Vote::Release => Decision::Release,
            Vote::Revert => Decision::Revert,
        }
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, InitSpace, PartialEq, Eq, Debug)]
pub struct SignerSlot {
    pub party: Pubkey,
    pub decision: Decision,
}

impl SignerSlot {
    pub fn new(party: Pubkey) -> Self {
        Self {
            party,
            decision: Decision::Undecided,
        }
    }
}

/// Where the tally stands after the latest decision.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tally {
    ReleaseQuorum,
    RevertQuorum,
    Split,
    Pending,
}

#[account]
#[derive(InitSpace, Default, Debug)]
pub struct EscrowRecord {
    pub reference_id: [u8; 32],
    pub owner: Pubkey,
    pub recipient: Pubkey,
    pub agent: Pubkey,
    pub delegator: Option<Pubkey>,
    pub token_kind: TokenKind,
    pub token_mint: Option<Pubkey>,
    pub yield_program: Pubkey,
    pub amount: u64,
    pub signers: [SignerSlot; SIGNER_COUNT],
    pub release_votes: u8,
    pub revert_votes: u8,
    pub last_activity_slot: u64,
    pub funded: bool,
    pub disputed: bool,
    pub finalized: bool,
    pub invest_yield: bool,
    pub bump: u8,
    pub vault_bump: u8,
}

impl EscrowRecord {
    /// Slot zero marks a record that was never created, so stamps never use it.
    pub fn activity_stamp(slot: u64) -> u64 {
        slot.max(1)
    }

    pub fn is_initialized(&self) -> bool {
        self.last_activity_slot != 0
    }

    pub fn touch(&mut self, slot: u64) {
        self.last_activity_slot = Self::activity_stamp(slot);
    }

    pub fn signer_index(&self, key: &Pubkey) -> Option<usize> {
        self.signers.iter().position(|slot| slot.party == *key)
    }

    /// Owner or the record's delegator.
    pub fn may_fund(&self, key: &Pubkey) -> bool {
        self.owner == *key || self.delegator == Some(*key)
    }

    pub fn may_escalate(&self, key: &Pubkey) -> bool {
        self.owner == *key || self.recipient == *key || self.delegator == Some(*key)
    }

    pub fn tally(&self) -> Tally {
        if self.release_votes == QUORUM {
            Tally::ReleaseQuorum
        } else if self.revert_votes == QUORUM {
            Tally::RevertQuorum
        } else if self.release_votes == 1 && self.revert_votes == 1 {
            Tally::Split
        } else {
            Tally::Pending
        }
    }

    /// Marks the record final and returns the winning owner.
    ///
    /// Only the tally reaches this. A second call is an invariant breach and
    /// must fail.
    pub fn finalize(&mut self) -> Result<Pubkey> {
        require!(!self.finalized, EscrowError::AlreadyFinalized);
        self.finalized = true;
        Ok(self.owner)
    }
}
