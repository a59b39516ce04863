use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::events::FundsWithdrawn;
use crate::helpers::{
    current_slot, native_vault_seeds, record_seeds, settlement, strategy_program, token_accounts,
    CustodyAccounts, Settlement,
};
use crate::lifecycle;
use crate::state::*;
use crate::store::{load_record, store_record};
use crate::yield_strategy::YieldStrategy;

#[derive(Accounts)]
#[instruction(reference_id: [u8; 32])]
pub struct Withdraw<'info> {
    /// Current owner of the record. Receives native payouts directly.
    #[account(mut)]
    pub owner: Signer<'info>,

    /// CHECK: Loaded through `store::load_record`, which reports a missing record as UnknownRecord.
    #[account(
        mut,
        seeds = [ESCROW_SEED, reference_id.as_ref()],
        bump,
    )]
    pub escrow_record: UncheckedAccount<'info>,

    /// CHECK: System-owned PDA that holds native deposits.
    #[account(
        mut,
        seeds = [NATIVE_VAULT_SEED, reference_id.as_ref()],
        bump,
    )]
    pub native_vault: UncheckedAccount<'info>,

    pub mint: Option<InterfaceAccount<'info, Mint>>,

    #[account(mut)]
    pub owner_token_account: Option<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut)]
    pub vault: Option<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Option<Interface<'info, TokenInterface>>,

    /// CHECK: Compared against the record's yield program before any call.
    pub yield_program: Option<UncheckedAccount<'info>>,

    pub system_program: Program<'info, System>,
}

pub fn handler<'info>(
    ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
    reference_id: [u8; 32],
    requested_amount: u64,
) -> Result<()> {
    let record_info = ctx.accounts.escrow_record.to_account_info();
    let mut record = load_record(&record_info)?;
    let owner = ctx.accounts.owner.key();

    let withdrawal = lifecycle::withdraw(&mut record, &owner, requested_amount, current_slot()?)?;

    let token = match record.token_kind {
        TokenKind::Native => None,
        TokenKind::Fungible => Some(token_accounts(
            &record,
            record_info.key,
            &owner,
            &ctx.accounts.mint,
            &ctx.accounts.vault,
            &ctx.accounts.owner_token_account,
            &ctx.accounts.token_program,
        )?),
    };
    let yield_program = if withdrawal.redeem {
        Some(strategy_program(&record, &ctx.accounts.yield_program)?)
    } else {
        None
    };

    let record_bump = [record.bump];
    let record_inner = record_seeds(&reference_id, &record_bump);
    let record_signer: &[&[&[u8]]] = &[&record_inner];
    let vault_bump = [record.vault_bump];
    let vault_inner = native_vault_seeds(&reference_id, &vault_bump);
    let vault_signer: &[&[&[u8]]] = &[&vault_inner];

    let Settlement {
        mut custody,
        mut strategy,
    } = settlement(
        &record,
        CustodyAccounts {
            system_program: ctx.accounts.system_program.to_account_info(),
            record: record_info.clone(),
            native_vault: ctx.accounts.native_vault.to_account_info(),
            counterparty: ctx.accounts.owner.to_account_info(),
        },
        token,
        yield_program,
        ctx.remaining_accounts,
        record_signer,
        vault_signer,
    )?;

    // Update state BEFORE CPI (checks-effects-interactions)
    store_record(&record_info, &record)?;

    lifecycle::settle_withdrawal(
        &withdrawal,
        &mut *custody,
        strategy.as_mut().map(|s| s as &mut dyn YieldStrategy),
    )?;

    emit!(FundsWithdrawn {
        reference_id,
        owner,
        amount: withdrawal.amount,
        remaining: withdrawal.remaining,
        slot: record.last_activity_slot,
    });

    Ok(())
}
