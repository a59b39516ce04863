#![allow(unexpected_cfgs)]

use anchor_lang::prelude::*;

declare_id!("7NLn8XQaLmzBoKS7i6mxj3opmdBQGPhdHeBxY9SoULt1");

pub mod custody;
pub mod error;
pub mod events;
pub mod helpers;
pub mod instructions;
pub mod lifecycle;
pub mod state;
pub mod store;
pub mod yield_strategy;

use instructions::*;
use state::{TokenKind, Vote};

#[program]
pub mod quorum_escrow {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    pub fn create_escrow(
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
        instructions::create_escrow::handler(
            ctx,
            reference_id,
            owner,
            recipient,
            agent,
            token_kind,
            yield_program,
            amount,
            invest_yield,
        )
    }

    pub fn deposit<'info>(
        ctx: Context<'_, '_, '_, 'info, Deposit<'info>>,
        reference_id: [u8; 32],
        supplied_amount: u64,
        attached_value: u64,
    ) -> Result<()> {
        instructions::deposit::handler(ctx, reference_id, supplied_amount, attached_value)
    }

    pub fn cast_decision(
        ctx: Context<CastDecision>,
        reference_id: [u8; 32],
        vote: Vote,
    ) -> Result<()> {
        instructions::cast_decision::handler(ctx, reference_id, vote)
    }

    pub fn escalate_dispute(
        ctx: Context<EscalateDispute>,
        reference_id: [u8; 32],
        party: Pubkey,
    ) -> Result<()> {
        instructions::escalate_dispute::handler(ctx, reference_id, party)
    }

    pub fn withdraw<'info>(
        ctx: Context<'_, '_, '_, 'info, Withdraw<'info>>,
        reference_id: [u8; 32],
        requested_amount: u64,
    ) -> Result<()> {
        instructions::withdraw::handler(ctx, reference_id, requested_amount)
    }

    pub fn quote_yield<'info>(
        ctx: Context<'_, '_, '_, 'info, QuoteYield<'info>>,
        reference_id: [u8; 32],
    ) -> Result<()> {
        instructions::quote_yield::handler(ctx, reference_id)
    }
}
