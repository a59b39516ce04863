use anchor_lang::prelude::*;

use crate::events::YieldQuoted;
use crate::helpers::check_strategy_program;
use crate::state::*;
use crate::store::load_record;
use crate::yield_strategy::{LendingStrategy, YieldStrategy};

/// Read-only: asks the record's strategy for its current rates.
/// Market accounts go in `remaining_accounts`.
#[derive(Accounts)]
#[instruction(reference_id: [u8; 32])]
pub struct QuoteYield<'info> {
    /// CHECK: Loaded through `store::load_record`, which reports a missing record as UnknownRecord.
    #[account(
        seeds = [ESCROW_SEED, reference_id.as_ref()],
        bump,
    )]
    pub escrow_record: UncheckedAccount<'info>,

    /// CHECK: Must match the record's yield program and be executable.
    pub yield_program: UncheckedAccount<'info>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, QuoteYield<'info>>,
    reference_id: [u8; 32],
) -> Result<()> {
    let record_info = ctx.accounts.escrow_record.to_account_info();
    let record = load_record(&record_info)?;

    let program = &ctx.accounts.yield_program;
    check_strategy_program(&record, program)?;

    // Queries move nothing, so custody is never touched and nothing signs.
    let mut strategy = LendingStrategy {
        program: program.to_account_info(),
        custody_authority: record_info.clone(),
        custody: record_info,
        market_accounts: ctx.remaining_accounts,
        signer_seeds: &[],
    };
    let exchange_rate = strategy.exchange_rate()?;
    let supply_rate = strategy.supply_rate()?;

    emit!(YieldQuoted {
        reference_id,
        yield_program: record.yield_program,
        exchange_rate,
        supply_rate,
    });

    Ok(())
}
