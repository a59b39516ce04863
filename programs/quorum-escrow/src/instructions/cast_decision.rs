use anchor_lang::prelude::*;

use crate::events::{DecisionCast, DisputeRaised, EscrowFinalized};
use crate::helpers::current_slot;
use crate::lifecycle::{self, DecisionOutcome};
use crate::state::*;
use crate::store::{load_record, store_record};

#[derive(Accounts)]
#[instruction(reference_id: [u8; 32])]
pub struct CastDecision<'info> {
    /// Must be one of the record's three signers.
    pub voter: Signer<'info>,

    /// CHECK: Loaded through `store::load_record`, which reports a missing record as UnknownRecord.
    #[account(
        mut,
        seeds = [ESCROW_SEED, reference_id.as_ref()],
        bump,
    )]
    pub escrow_record: UncheckedAccount<'info>,
}

pub fn handler(ctx: Context<CastDecision>, reference_id: [u8; 32], vote: Vote) -> Result<()> {
    let record_info = ctx.accounts.escrow_record.to_account_info();
    let mut record = load_record(&record_info)?;
    let voter = ctx.accounts.voter.key();

    let outcome = lifecycle::cast_decision(&mut record, &voter, vote, current_slot()?)?;
    store_record(&record_info, &record)?;

    emit!(DecisionCast {
        reference_id,
        voter,
        vote,
        release_votes: record.release_votes,
        revert_votes: record.revert_votes,
    });

    match outcome {
        DecisionOutcome::Disputed => {
            emit!(DisputeRaised {
                reference_id,
                slot: record.last_activity_slot,
            });
        }
        DecisionOutcome::Finalized { winner, .. } => {
            emit!(EscrowFinalized {
                reference_id,
                winner,
            });
        }
        DecisionOutcome::Pending => {}
    }

    Ok(())
}
