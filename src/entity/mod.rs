//! SeaORM entity definitions

pub mod achievement;
pub mod checkin;
pub mod daily_draw;
pub mod item;
pub mod milestone;
pub mod ownership;
pub mod redemption;
pub mod user;
pub mod user_achievement;
pub mod zone;

pub use achievement::AchievementKind;
pub use redemption::Tier;
