pub mod create_escrow;
pub mod deposit;
pub mod cast_decision;
pub mod escalate_dispute;
pub mod withdraw;
pub mod quote_yield;

// Every module exports a `handler` fn, so the glob re-exports overlap.
// Anchor's #[program] macro requires glob re-exports for generated account types.
#[allow(ambiguous_glob_reexports)]
pub use create_escrow::*;
pub use deposit::*;
pub use cast_decision::*;
pub use escalate_dispute::*;
pub use withdraw::*;
pub use quote_yield::*;
