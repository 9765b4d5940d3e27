//! Domain models for Pushbullet records

mod item;
mod watermark;

pub use item::{Collection, Iden, Item};
pub use watermark::Watermark;
