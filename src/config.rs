//! Deployer-tunable knobs for behavior left open by the data model.

use crate::types::Address;

/// Configuration threaded through a [`crate::Ledger`] at construction,
/// the way stake instruction processing threads a `FeatureSet`-like
/// object through the processor instead of hard-coding behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    /// If set, `create_rail` requires both `from` and `to` accounts to
    /// already hold a positive balance. Defaults to not requiring it.
    pub require_nonzero_rail_endpoints: bool,

    /// If set, every rail created under this configuration may only use
    /// the named arbiter. Defaults to `None` (any arbiter permitted).
    pub restrict_operator_arbiter: Option<Address>,
}
