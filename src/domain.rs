//! Domain module - identifiers and the output record
//!
//! Plain value types shared by the engine and the HTTP layer.

pub mod item_id;
pub mod record;

pub use item_id::ItemId;
pub use record::Record;
