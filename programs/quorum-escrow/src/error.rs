use anchor_lang::prelude::*;

#[error_code]
pub enum EscrowError {
    #[msg("Owner, recipient and agent must be distinct, non-zero accounts")]
    InvalidParty,

    #[msg("An escrow record already exists for this reference")]
    DuplicateRecord,

    #[msg("A delegator cannot also be the recipient or the agent")]
    InvalidDelegator,

    #[msg("No escrow record exists for this reference")]
    UnknownRecord,

    #[msg("Signer is not authorized for this operation")]
    Unauthorized,

    #[msg("Deposited value must equal the escrow amount exactly")]
    AmountMismatch,

    #[msg("Signer is not one of the escrow's three signers")]
    NotEligible,

    #[msg("Signer has already cast a decision")]
    AlreadyDecided,

    #[msg("Escrow is finalized; no further decisions are accepted")]
    RecordFinalized,

    #[msg("Escrow has already been finalized")]
    AlreadyFinalized,

    #[msg("Escrow has not been funded")]
    NotFunded,

    #[msg("Escrow has not been finalized")]
    NotFinalized,

    #[msg("Requested amount exceeds the remaining escrow balance")]
    ExcessiveWithdrawal,

    #[msg("Token transfer or yield strategy call failed")]
    TransferFailed,

    #[msg("Escrow has already been funded")]
    AlreadyFunded,

    #[msg("Token kind does not match the supplied mint configuration")]
    InvalidTokenConfig,

    #[msg("Yield strategy program is missing or does not match the escrow")]
    InvalidYieldStrategy,

    #[msg("Token mint does not match escrow mint")]
    MintMismatch,

    #[msg("Token account owner does not match expected owner")]
    OwnerMismatch,

    #[msg("Vault does not belong to this escrow")]
    VaultMismatch,

    #[msg("Token accounts are required for a fungible-token escrow")]
    MissingTokenAccounts,

    #[msg("Yield strategy did not return a rate")]
    YieldQuoteUnavailable,

    #[msg("Arithmetic overflow")]
    Overflow,
}
