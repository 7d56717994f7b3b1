//! Core domain types for streakcap

mod activity;
mod amount;
mod reward;

pub use activity::{ActivityRecord, ActivityType, RawActivityEvent, RawTimestamp};
pub use amount::{mul_div, AmountParseError, TokenAmount};
pub use reward::{RewardEvent, RewardKind};
