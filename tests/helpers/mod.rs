#![allow(dead_code, unused_imports)]

pub mod arbiter;
pub mod scenario;
pub mod vault;

pub use arbiter::{IdentityArbiter, NoArbiterRegistry, SaturatingArbiter, SingleRailRegistry};
pub use scenario::Scenario;
pub use vault::TestVault;
