use crate::datastore::{structs::Post, PostStore};
use crate::twoface::Fallible;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Store<T> = Arc<Mutex<Vec<T>>>;

/// The in-process fallback store. Clones share the same posts; nothing survives a restart.
#[derive(Clone, Default, Debug)]
pub struct MemoryStore {
    posts: Store<Post>,
}

impl MemoryStore {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Arc::new(Mutex::new(posts)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Post>> {
        // A panic while holding the lock can't leave a Vec<Post> half-written.
        self.posts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, post: Post) {
        self.lock().push(post);
    }

    /// Every post, in insertion order.
    pub fn snapshot(&self) -> Vec<Post> {
        self.lock().clone()
    }

    pub fn remove(&self, id: &str) -> bool {
        let mut posts = self.lock();
        guard!(let Some(index) = posts.iter().position(|p| p.id == id) else {
            return false
        });
        posts.remove(index);
        true
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn ensure_table(&self) -> Fallible<()> {
        Ok(())
    }

    async fn insert_post(&self, post: Post) -> Fallible<()> {
        self.insert(post);
        Ok(())
    }

    async fn list_posts(&self) -> Fallible<Vec<Post>> {
        Ok(self.snapshot())
    }

    async fn delete_post(&self, id: &str) -> Fallible<bool> {
        Ok(self.remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::structs::{sample_posts, NewPost};

    #[test]
    fn test_keeps_full_coordinate_precision() {
        let store = MemoryStore::default();
        let post = NewPost::new("hi".to_owned(), None, Some(-44.67193), Some(168.76261), None)
            .into_post("100".to_owned());
        store.insert(post);
        let posts = store.snapshot();
        assert_eq!(posts[0].latitude, Some(-44.67193));
        assert_eq!(posts[0].longitude, Some(168.76261));
    }

    #[test]
    fn test_remove_is_by_id() {
        let store = MemoryStore::with_posts(sample_posts());
        assert!(store.remove("3"));
        assert!(!store.remove("3"));
        assert!(!store.remove("does-not-exist"));
        let ids: Vec<_> = store.snapshot().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["1", "2", "4", "5"]);
    }

    #[test]
    fn test_clones_share_posts() {
        let store = MemoryStore::default();
        let other = store.clone();
        store.insert(NewPost::new("a".to_owned(), None, None, None, None).into_post("1".to_owned()));
        assert_eq!(other.snapshot().len(), 1);
    }
}
