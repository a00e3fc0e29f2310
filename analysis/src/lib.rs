pub mod interconnect;
pub mod ledger;
pub mod stats;
pub mod summary;

pub use interconnect::{build_interconnections, MULTI_COMMUNITY_USER};
pub use ledger::{ActivityLedger, CrosspostRef, Interaction};
pub use stats::{build_community_stats, round3};
pub use summary::RunSummary;
