use anchor_lang::prelude::*;
use anchor_spl::associated_token::get_associated_token_address_with_program_id;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

use crate::custody::{Custody, NativeCustody, TokenCustody};
use crate::error::EscrowError;
use crate::state::{EscrowRecord, TokenKind, ESCROW_SEED, NATIVE_VAULT_SEED};
use crate::yield_strategy::LendingStrategy;

/// Build record PDA signer seeds inner array.
pub fn record_seeds<'a>(reference_id: &'a [u8; 32], bump: &'a [u8; 1]) -> [&'a [u8]; 3] {
    [ESCROW_SEED, reference_id.as_ref(), bump]
}

/// Build native vault PDA signer seeds inner array.
pub fn native_vault_seeds<'a>(reference_id: &'a [u8; 32], bump: &'a [u8; 1]) -> [&'a [u8]; 3] {
    [NATIVE_VAULT_SEED, reference_id.as_ref(), bump]
}

pub fn current_slot() -> Result<u64> {
    Ok(Clock::get()?.slot)
}

/// Token-side accounts of a fungible record, present and consistent with it.
pub struct TokenAccounts<'a, 'info> {
    pub mint: &'a InterfaceAccount<'info, Mint>,
    pub vault: &'a InterfaceAccount<'info, TokenAccount>,
    pub counterparty_account: &'a InterfaceAccount<'info, TokenAccount>,
    pub token_program: &'a Interface<'info, TokenInterface>,
}

/// Verify the optional token accounts of a handler against the record.
///
/// The vault must be the record PDA's associated token account for the
/// record's mint, and the counterparty account must hold the same mint and
/// belong to `counterparty`.
pub fn token_accounts<'a, 'info>(
    record: &EscrowRecord,
    record_key: &Pubkey,
    counterparty: &Pubkey,
    mint: &'a Option<InterfaceAccount<'info, Mint>>,
    vault: &'a Option<InterfaceAccount<'info, TokenAccount>>,
    counterparty_account: &'a Option<InterfaceAccount<'info, TokenAccount>>,
    token_program: &'a Option<Interface<'info, TokenInterface>>,
) -> Result<TokenAccounts<'a, 'info>> {
    let (Some(mint), Some(vault), Some(counterparty_account), Some(token_program)) =
        (mint, vault, counterparty_account, token_program)
    else {
        return err!(EscrowError::MissingTokenAccounts);
    };

    require!(
        record.token_mint == Some(mint.key()),
        EscrowError::MintMismatch
    );
    require_keys_eq!(
        *mint.to_account_info().owner,
        token_program.key(),
        EscrowError::MintMismatch
    );

    let expected_vault =
        get_associated_token_address_with_program_id(record_key, &mint.key(), &token_program.key());
    require_keys_eq!(vault.key(), expected_vault, EscrowError::VaultMismatch);
    require_keys_eq!(vault.owner, *record_key, EscrowError::VaultMismatch);

    require_keys_eq!(counterparty_account.mint, mint.key(), EscrowError::MintMismatch);
    require_keys_eq!(counterparty_account.owner, *counterparty, EscrowError::OwnerMismatch);

    Ok(TokenAccounts {
        mint,
        vault,
        counterparty_account,
        token_program,
    })
}

/// The strategy program must be the record's non-default yield program and
/// executable.
pub fn strategy_matches(record: &EscrowRecord, program: &Pubkey, executable: bool) -> Result<()> {
    require!(
        record.yield_program != Pubkey::default() && *program == record.yield_program,
        EscrowError::InvalidYieldStrategy
    );
    require!(executable, EscrowError::InvalidYieldStrategy);
    Ok(())
}

pub fn check_strategy_program(record: &EscrowRecord, program: &UncheckedAccount) -> Result<()> {
    strategy_matches(record, program.key, program.executable)
}

/// The optional strategy program passed to a handler, checked against the record.
pub fn strategy_program<'a, 'info>(
    record: &EscrowRecord,
    yield_program: &'a Option<UncheckedAccount<'info>>,
) -> Result<&'a UncheckedAccount<'info>> {
    let program = yield_program
        .as_ref()
        .ok_or(error!(EscrowError::InvalidYieldStrategy))?;
    check_strategy_program(record, program)?;
    Ok(program)
}

/// Accounts every settlement touches regardless of token kind.
pub struct CustodyAccounts<'info> {
    pub system_program: AccountInfo<'info>,
    pub record: AccountInfo<'info>,
    pub native_vault: AccountInfo<'info>,
    /// Funder on deposit, owner on withdrawal.
    pub counterparty: AccountInfo<'info>,
}

/// Custody and, for yield-bearing records, the strategy that a handler
/// settles through once the record has been persisted.
pub struct Settlement<'a, 'info> {
    pub custody: Box<dyn Custody + 'a>,
    pub strategy: Option<LendingStrategy<'a, 'info>>,
}

pub fn settlement<'a, 'info: 'a>(
    record: &EscrowRecord,
    accounts: CustodyAccounts<'info>,
    token: Option<TokenAccounts<'_, 'info>>,
    yield_program: Option<&UncheckedAccount<'info>>,
    market_accounts: &'a [AccountInfo<'info>],
    record_signer: &'a [&'a [&'a [u8]]],
    vault_signer: &'a [&'a [&'a [u8]]],
) -> Result<Settlement<'a, 'info>> {
    let token = match record.token_kind {
        TokenKind::Native => None,
        TokenKind::Fungible => Some(token.ok_or(error!(EscrowError::MissingTokenAccounts))?),
    };

    let custody: Box<dyn Custody + 'a> = match &token {
        None => Box::new(NativeCustody {
            system_program: accounts.system_program.clone(),
            vault: accounts.native_vault.clone(),
            counterparty: accounts.counterparty.clone(),
            vault_seeds: vault_signer,
        }),
        Some(token) => Box::new(TokenCustody {
            token_program: token.token_program.to_account_info(),
            mint: token.mint.to_account_info(),
            decimals: token.mint.decimals,
            vault: token.vault.to_account_info(),
            vault_authority: accounts.record.clone(),
            counterparty_token_account: token.counterparty_account.to_account_info(),
            counterparty: accounts.counterparty.clone(),
            authority_seeds: record_signer,
        }),
    };

    // The native vault signs for itself; token custody is signed by the record.
    let strategy = yield_program.map(|program| {
        let (custody_authority, custody, signer_seeds) = match &token {
            None => (
                accounts.native_vault.clone(),
                accounts.native_vault.clone(),
                vault_signer,
            ),
            Some(token) => (
                accounts.record.clone(),
                token.vault.to_account_info(),
                record_signer,
            ),
        };
        LendingStrategy {
            program: program.to_account_info(),
            custody_authority,
            custody,
            market_accounts,
            signer_seeds,
        }
    });

    Ok(Settlement { custody, strategy })
}
