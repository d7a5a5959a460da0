pub mod achievement;
pub mod catalog;
pub mod draw;
pub mod redeem;
pub mod user;
pub mod zone;

pub use achievement::Achievement;
pub use catalog::Catalog;
pub use draw::Draw;
pub use redeem::Redeem;
pub use user::User;
pub use zone::Zone;
