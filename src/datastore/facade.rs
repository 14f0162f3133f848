//! `Posts` picks between the remote table and the in-memory fallback store. The choice is made
//! once per operation: if the remote table is configured and answers `ensure_table`, it's used;
//! otherwise the fallback store serves the whole operation. Reads never fail because of an outage.
use crate::datastore::{memory::MemoryStore, structs::sample_posts, NewPost, Post, PostStore};
use crate::ids::next_id;
use crate::metrics;
use crate::twoface::Fallible;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct Posts {
    remote: Option<Arc<dyn PostStore>>,
    fallback: MemoryStore,
}

/// The store chosen for one operation.
#[derive(Clone, Copy)]
enum Backend<'a> {
    Remote(&'a dyn PostStore),
    Fallback(&'a MemoryStore),
}

impl Backend<'_> {
    fn name(&self) -> &'static str {
        match self {
            Backend::Remote(_) => "remote",
            Backend::Fallback(_) => "fallback",
        }
    }
}

impl Posts {
    pub fn new(remote: Option<Arc<dyn PostStore>>, fallback: MemoryStore) -> Self {
        Self { remote, fallback }
    }

    /// No remote table at all, e.g. local development.
    pub fn fallback_only(fallback: MemoryStore) -> Self {
        Self::new(None, fallback)
    }

    async fn select(&self, operation: &'static str) -> Backend<'_> {
        guard!(let Some(remote) = &self.remote else {
            return Backend::Fallback(&self.fallback)
        });
        match remote.ensure_table().await {
            Ok(()) => Backend::Remote(remote.as_ref()),
            Err(e) => {
                warn!(operation, error = %format!("{:#}", e.internal), "remote table unavailable, using in-memory store");
                self.record_fallback(operation);
                Backend::Fallback(&self.fallback)
            }
        }
    }

    fn record_fallback(&self, operation: &'static str) {
        metrics::BACKEND_FALLBACKS
            .with_label_values(&[operation])
            .inc();
    }

    /// Assign an id and store the post. A remote insert failure degrades to the fallback store.
    pub async fn create_post(&self, new_post: NewPost) -> Post {
        let post = new_post.into_post(next_id());
        let backend = self.select("create").await;
        match backend {
            Backend::Remote(remote) => {
                if let Err(e) = remote.insert_post(post.clone()).await {
                    warn!(post_id = %post.id, error = %format!("{:#}", e.internal), "remote insert failed, storing post in memory");
                    self.record_fallback("create");
                    self.fallback.insert(post.clone());
                }
            }
            Backend::Fallback(fallback) => fallback.insert(post.clone()),
        }
        info!(post_id = %post.id, backend = backend.name(), "created post");
        post
    }

    /// Every post, flagged or not. Falls back to the in-memory posts if the remote listing fails.
    pub async fn list_posts(&self) -> Vec<Post> {
        match self.select("list").await {
            Backend::Remote(remote) => match remote.list_posts().await {
                Ok(posts) => posts,
                Err(e) => {
                    warn!(error = %format!("{:#}", e.internal), "remote listing failed, using in-memory store");
                    self.record_fallback("list");
                    self.fallback.snapshot()
                }
            },
            Backend::Fallback(fallback) => fallback.snapshot(),
        }
    }

    /// Posts keyed by id, for joining moderation records against.
    pub async fn post_index(&self) -> HashMap<String, Post> {
        self.list_posts()
            .await
            .into_iter()
            .map(|post| (post.id.clone(), post))
            .collect()
    }

    /// Best-effort removal from both stores. Returns true once the request has been processed,
    /// whether or not either store actually held the post.
    pub async fn delete_post(&self, id: &str) -> bool {
        if let Some(remote) = &self.remote {
            match remote.delete_post(id).await {
                Ok(true) => info!(post_id = id, "deleted post from remote table"),
                Ok(false) => info!(post_id = id, "post not in remote table"),
                Err(e) => {
                    warn!(post_id = id, error = %format!("{:#}", e.internal), "failed to delete from remote table")
                }
            }
        }
        if self.fallback.remove(id) {
            info!(post_id = id, "deleted post from in-memory store");
        }
        true
    }

    /// Insert the sample posts into the remote table. Returns how many were inserted.
    pub async fn seed_remote(&self) -> Fallible<usize> {
        guard!(let Some(remote) = &self.remote else {
            return Err(anyhow::anyhow!("no remote table configured").into())
        });
        remote.ensure_table().await?;
        let mut inserted = 0;
        for post in sample_posts() {
            let id = post.id.clone();
            match remote.insert_post(post).await {
                Ok(()) => {
                    info!(post_id = %id, "inserted sample post");
                    inserted += 1;
                }
                Err(e) => warn!(post_id = %id, error = %format!("{:#}", e.internal), "sample insert failed"),
            }
        }
        Ok(inserted)
    }
}
