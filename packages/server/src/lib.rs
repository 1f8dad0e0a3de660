// Skillswap - real-time delivery core
//
// Backend for the skill-exchange marketplace's live subsystems: the two-party
// private messaging channel, the per-user notification fan-out hub, and the
// saved-search matching engine. The surrounding CRUD surface lives elsewhere.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
