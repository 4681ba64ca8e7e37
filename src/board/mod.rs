pub mod item;
pub mod store;

pub use item::{BoardItem, DEFAULT_ITEM_SIZE, DEFAULT_TEXT, ItemId, ItemKind};
pub use store::{BoardEvent, BoardStore};
