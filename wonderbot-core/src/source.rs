use crate::{Category, CoreError, Item};

/// Supplies bounded windows of the newest items in a category.
pub trait ItemSource {
    async fn fetch_new(&self, category: Category, limit: u32) -> Result<Vec<Item>, CoreError>;
}

/// Posts a reply underneath an item.
pub trait ReplySink {
    async fn reply(&self, item: &Item, text: &str) -> Result<(), CoreError>;
}
