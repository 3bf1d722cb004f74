//! Batch verification pipeline: the one piece of real logic in the bot.

pub mod batch;
pub mod cache;
pub mod normalize;
pub mod report;


pub use batch::{BatchError, BatchSink, BatchVerifier, CheckerError, PresenceChecker};
pub use cache::PresenceCache;
pub use report::progress_text;
