//! Error kinds surfaced by the ledger.
//!
//! Mirrors the convention in `solana-stake-interface`'s `error::StakeError`:
//! one flat enum, one stable lower-case message per variant, no payload.
//! Every command is transactional — a returned `LedgerError` means the
//! ledger rolled back every mutation attempted within that command.

use num_derive::{FromPrimitive, ToPrimitive};
use thiserror::Error;

/// Reasons a ledger command can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, FromPrimitive, ToPrimitive)]
pub enum LedgerError {
    /// Caller is not the principal required for this command.
    #[error("caller is not authorized to perform this action")]
    AuthorizationDenied,

    /// The referenced rail, account, or operator approval does not exist.
    #[error("entity not found")]
    EntityMissing,

    /// The rail is inactive, or termination was requested on a rail that
    /// already has one in flight.
    #[error("rail is inactive or already terminating")]
    EntityInactive,

    /// `OperatorApproval::is_approved` is false.
    #[error("operator is not approved for this payer")]
    OperatorNotApproved,

    /// A rate or lockup increase would exceed the operator's allowance.
    #[error("requested change exceeds the operator's allowance")]
    AllowanceExceeded,

    /// Funds are insufficient for a one-time payment, withdrawal, or
    /// settlement transfer.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Locked amount is less than a required minimum.
    #[error("insufficient lockup")]
    InsufficientLockup,

    /// The account is not fully settled through the current epoch where
    /// full settlement is required.
    #[error("account lockup is not fully settled to the current epoch")]
    LockupNotSettled,

    /// A rate change was requested while the rail is in debt.
    #[error("rail is in debt with respect to its own lockup period")]
    DebtBlocked,

    /// An increase of rate/fixed lockup, or a change of lockup period, was
    /// attempted on a terminated rail.
    #[error("terminated rails may not increase lockup or rate, or change lockup period")]
    TerminatedRailRestriction,

    /// The arbiter returned a `settle_upto`/`modified_amount` outside the
    /// bounds the caller supplied, or no arbiter was provided although the
    /// rail requires one.
    #[error("arbiter violated its settlement contract")]
    ArbiterContractViolation,

    /// A checked arithmetic operation would have underflowed or
    /// overflowed. Indicates a programming error in the caller or engine.
    #[error("arithmetic operation underflowed or overflowed")]
    Arithmetic,

    /// The rail's per-rail modification lock is already held.
    #[error("rail is already being modified")]
    ConcurrentModification,

    /// An internal data-structure invariant (e.g. rate-change queue
    /// ordering) was violated.
    #[error("internal invariant violated")]
    InvariantBroken,
}
