use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::solana_program::program::{get_return_data, invoke, invoke_signed};

use crate::error::EscrowError;

pub const SUPPLY_DISCRIMINATOR: [u8; 8] = [81, 67, 116, 61, 250, 209, 5, 198];
pub const REDEEM_BY_UNDERLYING_DISCRIMINATOR: [u8; 8] = [160, 161, 68, 110, 154, 209, 18, 146];
pub const REDEEM_BY_SHARE_DISCRIMINATOR: [u8; 8] = [162, 63, 190, 229, 33, 252, 155, 165];
pub const EXCHANGE_RATE_DISCRIMINATOR: [u8; 8] = [168, 77, 41, 158, 147, 180, 79, 139];
pub const SUPPLY_RATE_DISCRIMINATOR: [u8; 8] = [101, 146, 159, 53, 73, 59, 6, 215];

/// External lending strategy. Only `supply` (on deposit) and
/// `redeem_by_underlying` (on withdrawal) move value; the rates are 1e18-scaled.
pub trait YieldStrategy {
    fn supply(&mut self, amount: u64) -> Result<()>;
    fn redeem_by_underlying(&mut self, amount: u64) -> Result<()>;
    fn redeem_by_share(&mut self, shares: u64) -> Result<()>;
    fn exchange_rate(&mut self) -> Result<u128>;
    fn supply_rate(&mut self) -> Result<u128>;
}

/// Anchor-style call data: `global:<name>` sighash, then an optional LE `u64`.
pub fn encode_call(discriminator: [u8; 8], amount: Option<u64>) -> Vec<u8> {
    let mut data = Vec::with_capacity(16);
    data.extend_from_slice(&discriminator);
    if let Some(amount) = amount {
        data.extend_from_slice(&amount.to_le_bytes());
    }
    data
}

/// Status code published by a strategy, when the return data has that shape.
pub fn decode_status(data: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = data.try_into().ok()?;
    Some(u64::from_le_bytes(bytes))
}

pub fn decode_rate(data: &[u8]) -> Option<u128> {
    let bytes: [u8; 16] = data.try_into().ok()?;
    Some(u128::from_le_bytes(bytes))
}

fn meta_for(info: &AccountInfo) -> AccountMeta {
    if info.is_writable {
        AccountMeta::new(*info.key, info.is_signer)
    } else {
        AccountMeta::new_readonly(*info.key, info.is_signer)
    }
}

/// CPI-backed strategy. Custody is either the native vault PDA (which is its
/// own authority) or the token vault owned by the record PDA. Supply and redeem
/// pass `[custody_authority (signer), custody (writable), ..market accounts]`.
pub struct LendingStrategy<'a, 'info> {
    pub program: AccountInfo<'info>,
    pub custody_authority: AccountInfo<'info>,
    pub custody: AccountInfo<'info>,
    pub market_accounts: &'a [AccountInfo<'info>],
    pub signer_seeds: &'a [&'a [&'a [u8]]],
}

impl<'info> LendingStrategy<'_, 'info> {
    fn move_value(&self, discriminator: [u8; 8], amount: u64) -> Result<()> {
        let mut accounts = vec![
            AccountMeta::new_readonly(*self.custody_authority.key, true),
            AccountMeta::new(*self.custody.key, false),
        ];
        accounts.extend(self.market_accounts.iter().map(meta_for));
        let ix = Instruction {
            program_id: *self.program.key,
            accounts,
            data: encode_call(discriminator, Some(amount)),
        };

        let mut infos: Vec<AccountInfo<'info>> =
            vec![self.custody_authority.clone(), self.custody.clone()];
        infos.extend(self.market_accounts.iter().cloned());
        infos.push(self.program.clone());

        invoke_signed(&ix, &infos, self.signer_seeds)
            .map_err(|_| error!(EscrowError::TransferFailed))?;

        if let Some((program_id, data)) = get_return_data() {
            if program_id == *self.program.key {
                let status = decode_status(&data).unwrap_or(0);
                require!(status == 0, EscrowError::TransferFailed);
            }
        }
        Ok(())
    }

    fn query(&self, discriminator: [u8; 8]) -> Result<u128> {
        let ix = Instruction {
            program_id: *self.program.key,
            accounts: self.market_accounts.iter().map(meta_for).collect(),
            data: encode_call(discriminator, None),
        };
        let mut infos: Vec<AccountInfo<'info>> = self.market_accounts.to_vec();
        infos.push(self.program.clone());

        invoke(&ix, &infos).map_err(|_| error!(EscrowError::YieldQuoteUnavailable))?;

        let (program_id, data) =
            get_return_data().ok_or(error!(EscrowError::YieldQuoteUnavailable))?;
        require_keys_eq!(program_id, *self.program.key, EscrowError::YieldQuoteUnavailable);
        decode_rate(&data).ok_or(error!(EscrowError::YieldQuoteUnavailable))
    }
}

impl YieldStrategy for LendingStrategy<'_, '_> {
    fn supply(&mut self, amount: u64) -> Result<()> {
        self.move_value(SUPPLY_DISCRIMINATOR, amount)
    }

    fn redeem_by_underlying(&mut self, amount: u64) -> Result<()> {
        self.move_value(REDEEM_BY_UNDERLYING_DISCRIMINATOR, amount)
    }

    fn redeem_by_share(&mut self, shares: u64) -> Result<()> {
        self.move_value(REDEEM_BY_SHARE_DISCRIMINATOR, shares)
    }

    fn exchange_rate(&mut self) -> Result<u128> {
        self.query(EXCHANGE_RATE_DISCRIMINATOR)
    }

    fn supply_rate(&mut self) -> Result<u128> {
        self.query(SUPPLY_RATE_DISCRIMINATOR)
    }
}
