use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};
use anchor_spl::{
    associated_token::{self, AssociatedToken, Create},
    token_interface::{Mint, TokenInterface},
};

use crate::error::EscrowError;
use crate::events::EscrowCreated;
use crate::helpers::current_slot;
use crate::lifecycle::{self, EscrowTerms};
use crate::state::*;

#[derive(Accounts)]
#[instruction(reference_id: [u8; 32])]
pub struct CreateEscrow<'info> {
    /// The owner, or a delegator creating on the owner's behalf. Pays rent.
    #[account(mut)]
    pub caller: Signer<'info>,

    // Existing records are loaded so the duplicate is reported as DuplicateRecord.
    #[account(
        init_if_needed,
        payer = caller,
        space = 8 + EscrowRecord::INIT_SPACE,
        seeds = [ESCROW_SEED, reference_id.as_ref()],
        bump,
    )]
    pub escrow_record: Account<'info, EscrowRecord>,

    /// CHECK: System-owned PDA that holds native deposits. Topped up to its rent floor here.
    #[account(
        mut,
        seeds = [NATIVE_VAULT_SEED, reference_id.as_ref()],
        bump,
    )]
    pub native_vault: UncheckedAccount<'info>,

    /// Required for fungible records only.
    pub mint: Option<InterfaceAccount<'info, Mint>>,

    /// CHECK: Created here as the record PDA's associated token account; the ATA program verifies the address.
    #[account(mut)]
    pub vault: Option<UncheckedAccount<'info>>,

    pub token_program: Option<Interface<'info, TokenInterface>>,
    pub associated_token_program: Option<Program<'info, AssociatedToken>>,
    pub system_program: Program<'info, System>,
}

#[allow(clippy::too_many_arguments)]
pub fn handler(
    ctx: Context<CreateEscrow>,
    reference_id: [u8; 32],
    owner: Pubkey,
    recipient: Pubkey,
    agent: Pubkey,
    token_kind: TokenKind,
    yield_program: Pubkey,
    amount: u64,
    invest_yield: bool,
) -> Result<()> {
    let slot = current_slot()?;
    let terms = EscrowTerms {
        reference_id,
        owner,
        recipient,
        agent,
        token_kind,
        token_mint: ctx.accounts.mint.as_ref().map(|mint| mint.key()),
        yield_program,
        amount,
        invest_yield,
    };
    let caller = ctx.accounts.caller.key();

    let record = &mut ctx.accounts.escrow_record;
    lifecycle::create(record, &terms, &caller, slot)?;
    record.bump = ctx.bumps.escrow_record;
    record.vault_bump = ctx.bumps.native_vault;

    match token_kind {
        TokenKind::Native => {
            let rent_floor = Rent::get()?.minimum_balance(0);
            let shortfall = rent_floor.saturating_sub(ctx.accounts.native_vault.lamports());
            if shortfall > 0 {
                let cpi_ctx = CpiContext::new(
                    ctx.accounts.system_program.to_account_info(),
                    Transfer {
                        from: ctx.accounts.caller.to_account_info(),
                        to: ctx.accounts.native_vault.to_account_info(),
                    },
                );
                system_program::transfer(cpi_ctx, shortfall)?;
            }
        }
        TokenKind::Fungible => {
            let (Some(mint), Some(vault), Some(token_program), Some(associated_token_program)) = (
                &ctx.accounts.mint,
                &ctx.accounts.vault,
                &ctx.accounts.token_program,
                &ctx.accounts.associated_token_program,
            ) else {
                return err!(EscrowError::MissingTokenAccounts);
            };
            require_keys_eq!(
                *mint.to_account_info().owner,
                token_program.key(),
                EscrowError::MintMismatch
            );

            let cpi_ctx = CpiContext::new(
                associated_token_program.to_account_info(),
                Create {
                    payer: ctx.accounts.caller.to_account_info(),
                    associated_token: vault.to_account_info(),
                    authority: record.to_account_info(),
                    mint: mint.to_account_info(),
                    system_program: ctx.accounts.system_program.to_account_info(),
                    token_program: token_program.to_account_info(),
                },
            );
            associated_token::create_idempotent(cpi_ctx)?;
        }
    }

    emit!(EscrowCreated {
        reference_id,
        owner: record.owner,
        amount: record.amount,
        recipient: record.recipient,
        agent: record.agent,
        slot: record.last_activity_slot,
    });

    Ok(())
}
