pub mod item;

pub use item::{Item, ItemPayload, NewItem};
