use anchor_lang::prelude::*;
use anchor_lang::system_program::{self, Transfer};
use anchor_spl::token_interface::{self, TokenAccount, TransferChecked};

use crate::error::EscrowError;

/// Value movement between a counterparty and the escrow's custody account.
///
/// Both directions are no-ops for a zero amount.
pub trait Custody {
    /// Counterparty -> custody. The counterparty signs.
    fn pull(&mut self, amount: u64) -> Result<()>;
    /// Custody -> counterparty. The program signs for custody.
    fn push(&mut self, amount: u64) -> Result<()>;
}

/// Lamports held by the system-owned vault PDA `[NATIVE_VAULT_SEED, reference_id]`.
pub struct NativeCustody<'a, 'info> {
    pub system_program: AccountInfo<'info>,
    pub vault: AccountInfo<'info>,
    pub counterparty: AccountInfo<'info>,
    pub vault_seeds: &'a [&'a [&'a [u8]]],
}

impl Custody for NativeCustody<'_, '_> {
    fn pull(&mut self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let cpi_ctx = CpiContext::new(
            self.system_program.clone(),
            Transfer {
                from: self.counterparty.clone(),
                to: self.vault.clone(),
            },
        );
        system_program::transfer(cpi_ctx, amount).map_err(|_| error!(EscrowError::TransferFailed))
    }

    fn push(&mut self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let cpi_ctx = CpiContext::new_with_signer(
            self.system_program.clone(),
            Transfer {
                from: self.vault.clone(),
                to: self.counterparty.clone(),
            },
            self.vault_seeds,
        );
        system_program::transfer(cpi_ctx, amount).map_err(|_| error!(EscrowError::TransferFailed))
    }
}

/// Tokens held by the record PDA's associated token account.
pub struct TokenCustody<'a, 'info> {
    pub token_program: AccountInfo<'info>,
    pub mint: AccountInfo<'info>,
    pub decimals: u8,
    pub vault: AccountInfo<'info>,
    /// The record PDA; signs pushes.
    pub vault_authority: AccountInfo<'info>,
    pub counterparty_token_account: AccountInfo<'info>,
    /// Signs pulls.
    pub counterparty: AccountInfo<'info>,
    pub authority_seeds: &'a [&'a [&'a [u8]]],
}

fn token_balance(account: &AccountInfo) -> Result<u64> {
    let data = account.try_borrow_data()?;
    Ok(TokenAccount::try_deserialize(&mut &data[..])?.amount)
}

/// Custody must grow by exactly `amount`. Mints that withhold a transfer fee
/// credit less and fail here.
pub fn ensure_credited(before: u64, after: u64, amount: u64) -> Result<()> {
    require!(
        after.checked_sub(before) == Some(amount),
        EscrowError::TransferFailed
    );
    Ok(())
}

impl Custody for TokenCustody<'_, '_> {
    fn pull(&mut self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let before = token_balance(&self.vault)?;
        let cpi_ctx = CpiContext::new(
            self.token_program.clone(),
            TransferChecked {
                from: self.counterparty_token_account.clone(),
                mint: self.mint.clone(),
                to: self.vault.clone(),
                authority: self.counterparty.clone(),
            },
        );
        token_interface::transfer_checked(cpi_ctx, amount, self.decimals)
            .map_err(|_| error!(EscrowError::TransferFailed))?;
        ensure_credited(before, token_balance(&self.vault)?, amount)
    }

    fn push(&mut self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let cpi_ctx = CpiContext::new_with_signer(
            self.token_program.clone(),
            TransferChecked {
                from: self.vault.clone(),
                mint: self.mint.clone(),
                to: self.counterparty_token_account.clone(),
                authority: self.vault_authority.clone(),
            },
            self.authority_seeds,
        );
        token_interface::transfer_checked(cpi_ctx, amount, self.decimals)
            .map_err(|_| error!(EscrowError::TransferFailed))
    }
}
