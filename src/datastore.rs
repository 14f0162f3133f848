pub mod facade;
pub mod memory;
pub mod postgres;
pub mod structs;
pub mod tables;

pub use facade::Posts;
pub use structs::{NewPost, Post};

use crate::twoface::Fallible;
use async_trait::async_trait;

#[async_trait]
/// The interface for storing post data. Ids are assigned before a post reaches the store.
pub trait PostStore: Send + Sync {
    /// Make sure the backing table exists. A table that already exists counts as success.
    async fn ensure_table(&self) -> Fallible<()>;
    async fn insert_post(&self, post: Post) -> Fallible<()>;
    async fn list_posts(&self) -> Fallible<Vec<Post>>;
    /// Hard-delete the post. Returns whether anything was removed.
    async fn delete_post(&self, id: &str) -> Fallible<bool>;
}
