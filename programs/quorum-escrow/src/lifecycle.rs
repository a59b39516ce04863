use anchor_lang::prelude::*;

use crate::custody::Custody;
use crate::error::EscrowError;
use crate::state::{Decision, EscrowRecord, SignerSlot, Tally, TokenKind, Vote};
use crate::yield_strategy::YieldStrategy;

/// Caller-supplied parameters of a new record.
#[derive(Clone, Copy, Debug)]
pub struct EscrowTerms {
    pub reference_id: [u8; 32],
    pub owner: Pubkey,
    pub recipient: Pubkey,
    pub agent: Pubkey,
    pub token_kind: TokenKind,
    pub token_mint: Option<Pubkey>,
    pub yield_program: Pubkey,
    pub amount: u64,
    pub invest_yield: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Funding {
    pub amount: u64,
    pub invest: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DecisionOutcome {
    Pending,
    Disputed,
    /// `released` is true when the recipient took ownership.
    Finalized { winner: Pubkey, released: bool },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Withdrawal {
    pub amount: u64,
    pub remaining: u64,
    pub redeem: bool,
}

pub fn create(
    record: &mut EscrowRecord,
    terms: &EscrowTerms,
    caller: &Pubkey,
    slot: u64,
) -> Result<()> {
    let EscrowTerms {
        owner,
        recipient,
        agent,
        ..
    } = *terms;

    require!(
        owner != Pubkey::default() && recipient != Pubkey::default() && agent != Pubkey::default(),
        EscrowError::InvalidParty
    );
    require!(
        owner != recipient && owner != agent && recipient != agent,
        EscrowError::InvalidParty
    );
    require!(!record.is_initialized(), EscrowError::DuplicateRecord);

    let delegator = if *caller != owner {
        require!(
            *caller != recipient && *caller != agent,
            EscrowError::InvalidDelegator
        );
        Some(*caller)
    } else {
        None
    };

    match (terms.token_kind, terms.token_mint) {
        (TokenKind::Native, None) => {}
        (TokenKind::Fungible, Some(mint)) if mint != Pubkey::default() => {}
        _ => return err!(EscrowError::InvalidTokenConfig),
    }
    require!(
        !terms.invest_yield || terms.yield_program != Pubkey::default(),
        EscrowError::InvalidYieldStrategy
    );

    record.reference_id = terms.reference_id;
    record.owner = owner;
    record.recipient = recipient;
    record.agent = agent;
    record.delegator = delegator;
    record.token_kind = terms.token_kind;
    record.token_mint = terms.token_mint;
    record.yield_program = terms.yield_program;
    record.amount = terms.amount;
    record.signers = [
        SignerSlot::new(owner),
        SignerSlot::new(recipient),
        SignerSlot::new(agent),
    ];
    record.release_votes = 0;
    record.revert_votes = 0;
    record.funded = false;
    record.disputed = false;
    record.finalized = false;
    record.invest_yield = terms.invest_yield;
    record.touch(slot);
    Ok(())
}

/// Native records are funded by `attached_value`, token records by
/// `supplied_amount`. Either must equal the agreed amount exactly.
pub fn deposit(
    record: &mut EscrowRecord,
    funder: &Pubkey,
    supplied_amount: u64,
    attached_value: u64,
    slot: u64,
) -> Result<Funding> {
    require!(record.may_fund(funder), EscrowError::Unauthorized);
    require!(!record.funded, EscrowError::AlreadyFunded);

    let offered = match record.token_kind {
        TokenKind::Native => attached_value,
        TokenKind::Fungible => supplied_amount,
    };
    require!(offered == record.amount, EscrowError::AmountMismatch);

    record.funded = true;
    record.touch(slot);
    Ok(Funding {
        amount: record.amount,
        invest: record.invest_yield,
    })
}

pub fn settle_deposit(
    funding: &Funding,
    custody: &mut dyn Custody,
    strategy: Option<&mut dyn YieldStrategy>,
) -> Result<()> {
    custody.pull(funding.amount)?;
    if funding.invest {
        let strategy = strategy.ok_or(error!(EscrowError::InvalidYieldStrategy))?;
        strategy.supply(funding.amount)?;
    }
    Ok(())
}

pub fn cast_decision(
    record: &mut EscrowRecord,
    voter: &Pubkey,
    vote: Vote,
    slot: u64,
) -> Result<DecisionOutcome> {
    require!(!record.finalized, EscrowError::RecordFinalized);
    let idx = record
        .signer_index(voter)
        .ok_or(error!(EscrowError::NotEligible))?;
    require!(
        record.signers[idx].decision == Decision::Undecided,
        EscrowError::AlreadyDecided
    );

    record.signers[idx].decision = vote.into();
    match vote {
        Vote::Release => {
            record.release_votes = record
                .release_votes
                .checked_add(1)
                .ok_or(EscrowError::Overflow)?;
        }
        Vote::Revert => {
            record.revert_votes = record
                .revert_votes
                .checked_add(1)
                .ok_or(EscrowError::Overflow)?;
        }
    }
    record.touch(slot);

    match record.tally() {
        Tally::ReleaseQuorum => {
            record.owner = record.recipient;
            let winner = record.finalize()?;
            Ok(DecisionOutcome::Finalized {
                winner,
                released: true,
            })
        }
        Tally::RevertQuorum => {
            let winner = record.finalize()?;
            Ok(DecisionOutcome::Finalized {
                winner,
                released: false,
            })
        }
        Tally::Split => {
            record.disputed = true;
            Ok(DecisionOutcome::Disputed)
        }
        Tally::Pending => Ok(DecisionOutcome::Pending),
    }
}

/// Out-of-band dispute flag. Leaves the vote counts alone.
pub fn escalate_dispute(
    record: &mut EscrowRecord,
    caller: &Pubkey,
    party: &Pubkey,
    slot: u64,
) -> Result<()> {
    require!(record.may_escalate(caller), EscrowError::Unauthorized);
    require!(!record.finalized, EscrowError::RecordFinalized);
    require!(
        *party == record.owner || *party == record.recipient,
        EscrowError::InvalidParty
    );

    record.disputed = true;
    record.touch(slot);
    Ok(())
}

pub fn withdraw(
    record: &mut EscrowRecord,
    caller: &Pubkey,
    requested: u64,
    slot: u64,
) -> Result<Withdrawal> {
    require_keys_eq!(*caller, record.owner, EscrowError::Unauthorized);
    require!(record.funded, EscrowError::NotFunded);
    require!(record.finalized, EscrowError::NotFinalized);
    require!(requested <= record.amount, EscrowError::ExcessiveWithdrawal);

    record.amount = record
        .amount
        .checked_sub(requested)
        .ok_or(EscrowError::Overflow)?;
    record.touch(slot);
    Ok(Withdrawal {
        amount: requested,
        remaining: record.amount,
        redeem: record.invest_yield,
    })
}

pub fn settle_withdrawal(
    withdrawal: &Withdrawal,
    custody: &mut dyn Custody,
    strategy: Option<&mut dyn YieldStrategy>,
) -> Result<()> {
    if withdrawal.amount == 0 {
        return Ok(());
    }
    if withdrawal.redeem {
        let strategy = strategy.ok_or(error!(EscrowError::InvalidYieldStrategy))?;
        strategy.redeem_by_underlying(withdrawal.amount)?;
    }
    custody.push(withdrawal.amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SIGNER_COUNT;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Journal = Rc<RefCell<Vec<&'static str>>>;

    struct Parties {
        a: Pubkey,
        b: Pubkey,
        c: Pubkey,
    }

    fn parties() -> Parties {
        Parties {
            a: Pubkey::new_unique(),
            b: Pubkey::new_unique(),
            c: Pubkey::new_unique(),
        }
    }

    fn reference(tag: &[u8]) -> [u8; 32] {
        let mut id = [0u8; 32];
        id[..tag.len()].copy_from_slice(tag);
        id
    }

    fn terms(p: &Parties, amount: u64) -> EscrowTerms {
        EscrowTerms {
            reference_id: reference(b"e1"),
            owner: p.a,
            recipient: p.b,
            agent: p.c,
            token_kind: TokenKind::Native,
            token_mint: None,
            yield_program: Pubkey::default(),
            amount,
            invest_yield: false,
        }
    }

    fn opened(p: &Parties, amount: u64) -> EscrowRecord {
        let mut record = EscrowRecord::default();
        create(&mut record, &terms(p, amount), &p.a, 10).unwrap();
        record
    }

    fn funded(p: &Parties, amount: u64) -> EscrowRecord {
        let mut record = opened(p, amount);
        deposit(&mut record, &p.a, 0, amount, 11).unwrap();
        record
    }

    fn code(err: anchor_lang::error::Error) -> u32 {
        match err {
            anchor_lang::error::Error::AnchorError(e) => e.error_code_number,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn assert_fails<T: std::fmt::Debug>(result: Result<T>, expected: EscrowError) {
        assert_eq!(code(result.unwrap_err()), u32::from(expected));
    }

    #[derive(Default)]
    struct FakeCustody {
        journal: Journal,
        pulled: u64,
        pushed: u64,
        fail: bool,
    }

    impl Custody for FakeCustody {
        fn pull(&mut self, amount: u64) -> Result<()> {
            if self.fail {
                return err!(EscrowError::TransferFailed);
            }
            self.journal.borrow_mut().push("pull");
            self.pulled += amount;
            Ok(())
        }

        fn push(&mut self, amount: u64) -> Result<()> {
            if self.fail {
                return err!(EscrowError::TransferFailed);
            }
            self.journal.borrow_mut().push("push");
            self.pushed += amount;
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeStrategy {
        journal: Journal,
        supplied: u64,
        redeemed: u64,
        fail: bool,
    }

    impl YieldStrategy for FakeStrategy {
        fn supply(&mut self, amount: u64) -> Result<()> {
            if self.fail {
                return err!(EscrowError::TransferFailed);
            }
            self.journal.borrow_mut().push("supply");
            self.supplied += amount;
            Ok(())
        }

        fn redeem_by_underlying(&mut self, amount: u64) -> Result<()> {
            if self.fail {
                return err!(EscrowError::TransferFailed);
            }
            self.journal.borrow_mut().push("redeem");
            self.redeemed += amount;
            Ok(())
        }

        fn redeem_by_share(&mut self, shares: u64) -> Result<()> {
            self.redeem_by_underlying(shares)
        }

        fn exchange_rate(&mut self) -> Result<u128> {
            Ok(1_000_000_000_000_000_000)
        }

        fn supply_rate(&mut self) -> Result<u128> {
            Ok(0)
        }
    }


    #[test]
    fn create_initializes_every_field() {
        let p = parties();
        let record = opened(&p, 100);

        assert_eq!(record.owner, p.a);
        assert_eq!(record.recipient, p.b);
        assert_eq!(record.agent, p.c);
        assert_eq!(record.delegator, None);
        assert_eq!(record.amount, 100);
        assert_eq!(record.last_activity_slot, 10);
        assert_eq!(record.signers.map(|s| s.party), [p.a, p.b, p.c]);
        assert!(record.signers.iter().all(|s| s.decision == Decision::Undecided));
        assert_eq!((record.release_votes, record.revert_votes), (0, 0));
        assert!(!record.funded && !record.disputed && !record.finalized && !record.invest_yield);
    }

    #[test]
    fn create_rejects_null_or_repeated_parties() {
        let p = parties();
        let cases = [
            (Pubkey::default(), p.b, p.c),
            (p.a, Pubkey::default(), p.c),
            (p.a, p.b, Pubkey::default()),
            (p.a, p.a, p.c),
            (p.a, p.b, p.a),
            (p.a, p.b, p.b),
        ];
        for (owner, recipient, agent) in cases {
            let mut record = EscrowRecord::default();
            let t = EscrowTerms {
                owner,
                recipient,
                agent,
                ..terms(&p, 100)
            };
            assert_fails(create(&mut record, &t, &owner, 1), EscrowError::InvalidParty);
            assert!(!record.is_initialized());
        }
    }

    #[test]
    fn second_create_under_same_reference_fails() {
        let p = parties();
        let mut record = opened(&p, 100);
        let other = parties();
        let different = EscrowTerms {
            amount: 5,
            ..terms(&other, 5)
        };
        assert_fails(
            create(&mut record, &different, &other.a, 20),
            EscrowError::DuplicateRecord,
        );
        assert_eq!(record.owner, p.a);
        assert_eq!(record.amount, 100);
    }

    #[test]
    fn outside_caller_becomes_delegator() {
        let p = parties();
        let funder = Pubkey::new_unique();
        let mut record = EscrowRecord::default();
        create(&mut record, &terms(&p, 100), &funder, 3).unwrap();
        assert_eq!(record.delegator, Some(funder));
        assert_eq!(record.owner, p.a);
    }

    #[test]
    fn recipient_or_agent_cannot_delegate() {
        let p = parties();
        for caller in [p.b, p.c] {
            let mut record = EscrowRecord::default();
            assert_fails(
                create(&mut record, &terms(&p, 100), &caller, 3),
                EscrowError::InvalidDelegator,
            );
        }
    }

    #[test]
    fn token_kind_must_match_mint() {
        let p = parties();
        let native_with_mint = EscrowTerms {
            token_mint: Some(Pubkey::new_unique()),
            ..terms(&p, 1)
        };
        let token_without_mint = EscrowTerms {
            token_kind: TokenKind::Fungible,
            ..terms(&p, 1)
        };
        for t in [native_with_mint, token_without_mint] {
            let mut record = EscrowRecord::default();
            assert_fails(create(&mut record, &t, &p.a, 1), EscrowError::InvalidTokenConfig);
        }
    }

    #[test]
    fn yield_needs_a_strategy_program() {
        let p = parties();
        let t = EscrowTerms {
            invest_yield: true,
            ..terms(&p, 1)
        };
        let mut record = EscrowRecord::default();
        assert_fails(create(&mut record, &t, &p.a, 1), EscrowError::InvalidYieldStrategy);
    }


    #[test]
    fn deposit_by_owner_marks_funded() {
        let p = parties();
        let mut record = opened(&p, 100);
        let funding = deposit(&mut record, &p.a, 0, 100, 12).unwrap();
        assert_eq!(funding, Funding { amount: 100, invest: false });
        assert!(record.funded);
        assert_eq!(record.last_activity_slot, 12);
    }

    #[test]
    fn deposit_by_delegator_is_allowed_and_strangers_are_not() {
        let p = parties();
        let delegator = Pubkey::new_unique();
        let mut record = EscrowRecord::default();
        create(&mut record, &terms(&p, 100), &delegator, 1).unwrap();

        assert_fails(
            deposit(&mut record, &p.b, 0, 100, 2),
            EscrowError::Unauthorized,
        );
        assert_fails(
            deposit(&mut record, &Pubkey::new_unique(), 0, 100, 2),
            EscrowError::Unauthorized,
        );
        assert!(!record.funded);
        deposit(&mut record, &delegator, 0, 100, 2).unwrap();
        assert!(record.funded);
    }

    #[test]
    fn deposit_must_match_exactly() {
        let p = parties();
        for attached in [99, 101, 0] {
            let mut record = opened(&p, 100);
            let before = record.clone();
            assert_fails(
                deposit(&mut record, &p.a, 100, attached, 2),
                EscrowError::AmountMismatch,
            );
            assert!(!record.funded);
            assert_eq!(record.last_activity_slot, before.last_activity_slot);
        }
    }

    #[test]
    fn token_deposit_checks_supplied_amount() {
        let p = parties();
        let t = EscrowTerms {
            token_kind: TokenKind::Fungible,
            token_mint: Some(Pubkey::new_unique()),
            ..terms(&p, 50)
        };
        let mut record = EscrowRecord::default();
        create(&mut record, &t, &p.a, 1).unwrap();

        assert_fails(deposit(&mut record, &p.a, 49, 50, 2), EscrowError::AmountMismatch);
        deposit(&mut record, &p.a, 50, 0, 2).unwrap();
        assert!(record.funded);
    }

    #[test]
    fn second_deposit_is_rejected() {
        let p = parties();
        let mut record = funded(&p, 100);
        assert_fails(deposit(&mut record, &p.a, 0, 100, 3), EscrowError::AlreadyFunded);
    }

    #[test]
    fn settle_deposit_pulls_then_supplies() {
        let journal = Journal::default();
        let mut custody = FakeCustody {
            journal: journal.clone(),
            ..Default::default()
        };
        let mut strategy = FakeStrategy {
            journal: journal.clone(),
            ..Default::default()
        };
        let funding = Funding { amount: 100, invest: true };

        settle_deposit(&funding, &mut custody, Some(&mut strategy)).unwrap();

        assert_eq!(*journal.borrow(), vec!["pull", "supply"]);
        assert_eq!(custody.pulled, 100);
        assert_eq!(strategy.supplied, 100);
    }

    #[test]
    fn settle_deposit_skips_strategy_when_not_investing() {
        let mut custody = FakeCustody::default();
        let mut strategy = FakeStrategy::default();
        let funding = Funding { amount: 7, invest: false };

        settle_deposit(&funding, &mut custody, Some(&mut strategy)).unwrap();
        assert_eq!(custody.pulled, 7);
        assert_eq!(strategy.supplied, 0);
    }

    #[test]
    fn strategy_failure_fails_the_deposit() {
        let mut custody = FakeCustody::default();
        let mut strategy = FakeStrategy {
            fail: true,
            ..Default::default()
        };
        let funding = Funding { amount: 100, invest: true };
        assert_fails(
            settle_deposit(&funding, &mut custody, Some(&mut strategy)),
            EscrowError::TransferFailed,
        );
        assert_fails(
            settle_deposit(&funding, &mut FakeCustody::default(), None),
            EscrowError::InvalidYieldStrategy,
        );
    }


    #[test]
    fn two_releases_hand_ownership_to_recipient() {
        let p = parties();
        let mut record = funded(&p, 100);

        assert_eq!(
            cast_decision(&mut record, &p.a, Vote::Release, 20).unwrap(),
            DecisionOutcome::Pending
        );
        assert_eq!(
            cast_decision(&mut record, &p.b, Vote::Release, 21).unwrap(),
            DecisionOutcome::Finalized {
                winner: p.b,
                released: true
            }
        );
        assert_eq!(record.release_votes, 2);
        assert_eq!(record.owner, p.b);
        assert!(record.finalized);

        for late in [p.a, p.c] {
            assert_fails(
                cast_decision(&mut record, &late, Vote::Revert, 22),
                EscrowError::RecordFinalized,
            );
        }
        assert_eq!(record.owner, p.b);
    }

    #[test]
    fn split_vote_disputes_then_third_signer_decides() {
        let p = parties();
        let mut record = funded(&p, 100);

        cast_decision(&mut record, &p.a, Vote::Release, 20).unwrap();
        assert_eq!(
            cast_decision(&mut record, &p.c, Vote::Revert, 21).unwrap(),
            DecisionOutcome::Disputed
        );
        assert!(record.disputed);
        assert!(!record.finalized);

        assert_eq!(
            cast_decision(&mut record, &p.b, Vote::Revert, 22).unwrap(),
            DecisionOutcome::Finalized {
                winner: p.a,
                released: false
            }
        );
        assert_eq!(record.revert_votes, 2);
        assert_eq!(record.owner, p.a);
        assert!(record.finalized);

        let w = withdraw(&mut record, &p.a, 100, 23).unwrap();
        assert_eq!(w.remaining, 0);
        assert_eq!(record.amount, 0);
        assert_fails(
            withdraw(&mut record, &p.a, 1, 24),
            EscrowError::ExcessiveWithdrawal,
        );
    }

    #[test]
    fn double_vote_is_rejected_without_touching_counters() {
        let p = parties();
        let mut record = funded(&p, 100);
        cast_decision(&mut record, &p.a, Vote::Release, 20).unwrap();

        for vote in [Vote::Release, Vote::Revert] {
            assert_fails(
                cast_decision(&mut record, &p.a, vote, 21),
                EscrowError::AlreadyDecided,
            );
        }
        assert_eq!((record.release_votes, record.revert_votes), (1, 0));
        assert_eq!(record.signers[0].decision, Decision::Release);
        assert_eq!(record.last_activity_slot, 20);
    }

    #[test]
    fn only_signers_may_vote() {
        let p = parties();
        let delegator = Pubkey::new_unique();
        let mut record = EscrowRecord::default();
        create(&mut record, &terms(&p, 100), &delegator, 1).unwrap();

        for outsider in [delegator, Pubkey::new_unique()] {
            assert_fails(
                cast_decision(&mut record, &outsider, Vote::Release, 2),
                EscrowError::NotEligible,
            );
        }
        assert_eq!((record.release_votes, record.revert_votes), (0, 0));
    }

    #[test]
    fn every_vote_order_respects_the_quorum() {
        let p = parties();
        let orders = [
            [p.a, p.b, p.c],
            [p.a, p.c, p.b],
            [p.b, p.a, p.c],
            [p.b, p.c, p.a],
            [p.c, p.a, p.b],
            [p.c, p.b, p.a],
        ];
        for order in orders {
            for mask in 0u8..8 {
                let mut record = opened(&p, 100);
                for (i, voter) in order.iter().enumerate() {
                    let vote = if mask & (1 << i) == 0 { Vote::Release } else { Vote::Revert };
                    let _ = cast_decision(&mut record, voter, vote, 5);

                    assert!(
                        (record.release_votes + record.revert_votes) as usize <= SIGNER_COUNT
                    );
                    let cast = |d: Decision| {
                        record.signers.iter().filter(|s| s.decision == d).count() as u8
                    };
                    assert_eq!(record.release_votes, cast(Decision::Release));
                    assert_eq!(record.revert_votes, cast(Decision::Revert));
                    if record.finalized {
                        assert!(record.release_votes == 2 || record.revert_votes == 2);
                    }
                }
                assert!(record.finalized);
                let expected_owner = if record.release_votes == 2 { p.b } else { p.a };
                assert_eq!(record.owner, expected_owner);
            }
        }
    }

    #[test]
    fn votes_count_before_funding() {
        let p = parties();
        let mut record = opened(&p, 100);
        cast_decision(&mut record, &p.a, Vote::Revert, 2).unwrap();
        cast_decision(&mut record, &p.c, Vote::Revert, 3).unwrap();
        assert!(record.finalized);
        assert_fails(withdraw(&mut record, &p.a, 1, 4), EscrowError::NotFunded);
    }


    #[test]
    fn escalation_flags_without_counting() {
        let p = parties();
        let delegator = Pubkey::new_unique();
        let mut record = EscrowRecord::default();
        create(&mut record, &terms(&p, 100), &delegator, 1).unwrap();

        escalate_dispute(&mut record, &delegator, &p.b, 9).unwrap();
        assert!(record.disputed);
        assert_eq!(record.last_activity_slot, 9);
        assert_eq!((record.release_votes, record.revert_votes), (0, 0));
        assert!(!record.finalized);

        escalate_dispute(&mut record, &p.b, &p.a, 10).unwrap();
    }

    #[test]
    fn escalation_guards() {
        let p = parties();
        let mut record = funded(&p, 100);

        assert_fails(
            escalate_dispute(&mut record, &p.c, &p.a, 2),
            EscrowError::Unauthorized,
        );
        assert_fails(
            escalate_dispute(&mut record, &p.a, &p.c, 2),
            EscrowError::InvalidParty,
        );
        assert!(!record.disputed);

        cast_decision(&mut record, &p.a, Vote::Release, 3).unwrap();
        cast_decision(&mut record, &p.b, Vote::Release, 4).unwrap();
        assert_fails(
            escalate_dispute(&mut record, &p.b, &p.b, 5),
            EscrowError::RecordFinalized,
        );
    }


    #[test]
    fn withdraw_guards_run_in_order() {
        let p = parties();
        let mut record = funded(&p, 100);

        assert_fails(withdraw(&mut record, &p.b, 1, 2), EscrowError::Unauthorized);
        assert_fails(withdraw(&mut record, &p.a, 1, 2), EscrowError::NotFinalized);

        let mut unfunded = opened(&p, 100);
        assert_fails(withdraw(&mut unfunded, &p.a, 1, 2), EscrowError::NotFunded);

        cast_decision(&mut record, &p.a, Vote::Revert, 3).unwrap();
        cast_decision(&mut record, &p.b, Vote::Revert, 4).unwrap();
        assert_fails(
            withdraw(&mut record, &p.a, 101, 5),
            EscrowError::ExcessiveWithdrawal,
        );
        assert_eq!(record.amount, 100);
    }

    #[test]
    fn partial_withdrawals_never_exceed_the_deposit() {
        let p = parties();
        let mut record = funded(&p, 100);
        cast_decision(&mut record, &p.b, Vote::Release, 3).unwrap();
        cast_decision(&mut record, &p.c, Vote::Release, 4).unwrap();

        let mut total = 0;
        for chunk in [30, 30, 30, 30] {
            if let Ok(w) = withdraw(&mut record, &p.b, chunk, 5) {
                total += w.amount;
            }
        }
        assert_eq!(total, 90);
        assert_eq!(record.amount, 10);
        assert_fails(withdraw(&mut record, &p.a, 10, 6), EscrowError::Unauthorized);
        withdraw(&mut record, &p.b, 10, 6).unwrap();
        assert_eq!(record.amount, 0);
    }

    #[test]
    fn settle_withdrawal_redeems_before_paying_out() {
        let journal = Journal::default();
        let mut custody = FakeCustody {
            journal: journal.clone(),
            ..Default::default()
        };
        let mut strategy = FakeStrategy {
            journal: journal.clone(),
            ..Default::default()
        };
        let w = Withdrawal {
            amount: 40,
            remaining: 60,
            redeem: true,
        };

        settle_withdrawal(&w, &mut custody, Some(&mut strategy)).unwrap();
        assert_eq!(*journal.borrow(), vec!["redeem", "push"]);
        assert_eq!(strategy.redeemed, 40);
        assert_eq!(custody.pushed, 40);
    }

    #[test]
    fn failed_payout_surfaces_as_transfer_failure() {
        let mut custody = FakeCustody {
            fail: true,
            ..Default::default()
        };
        let w = Withdrawal {
            amount: 40,
            remaining: 60,
            redeem: false,
        };
        assert_fails(
            settle_withdrawal(&w, &mut custody, None),
            EscrowError::TransferFailed,
        );
    }

    #[test]
    fn invested_withdrawal_needs_the_strategy() {
        let w = Withdrawal {
            amount: 1,
            remaining: 0,
            redeem: true,
        };
        assert_fails(
            settle_withdrawal(&w, &mut FakeCustody::default(), None),
            EscrowError::InvalidYieldStrategy,
        );
    }

    #[test]
    fn zero_withdrawal_of_invested_record_moves_nothing() {
        let journal = Journal::default();
        let mut custody = FakeCustody {
            journal: journal.clone(),
            ..Default::default()
        };
        let mut strategy = FakeStrategy {
            journal: journal.clone(),
            ..Default::default()
        };
        let w = Withdrawal {
            amount: 0,
            remaining: 100,
            redeem: true,
        };

        settle_withdrawal(&w, &mut custody, Some(&mut strategy)).unwrap();
        assert!(journal.borrow().is_empty());
        assert_eq!((strategy.redeemed, custody.pushed), (0, 0));

        settle_withdrawal(&w, &mut custody, None).unwrap();
        assert!(journal.borrow().is_empty());
    }
}
