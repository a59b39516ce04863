use anchor_lang::prelude::*;

use crate::events::DisputeEscalated;
use crate::helpers::current_slot;
use crate::lifecycle;
use crate::state::*;
use crate::store::{load_record, store_record};

#[derive(Accounts)]
#[instruction(reference_id: [u8; 32])]
pub struct EscalateDispute<'info> {
    /// Owner, recipient or the record's delegator.
    pub caller: Signer<'info>,

    /// CHECK: Loaded through `store::load_record`, which reports a missing record as UnknownRecord.
    #[account(
        mut,
        seeds = [ESCROW_SEED, reference_id.as_ref()],
        bump,
    )]
    pub escrow_record: UncheckedAccount<'info>,
}

pub fn handler(
    ctx: Context<EscalateDispute>,
    reference_id: [u8; 32],
    party: Pubkey,
) -> Result<()> {
    let record_info = ctx.accounts.escrow_record.to_account_info();
    let mut record = load_record(&record_info)?;
    let caller = ctx.accounts.caller.key();

    lifecycle::escalate_dispute(&mut record, &caller, &party, current_slot()?)?;
    store_record(&record_info, &record)?;

    emit!(DisputeEscalated {
        reference_id,
        caller,
        party,
        slot: record.last_activity_slot,
    });

    Ok(())
}
