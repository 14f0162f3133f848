use serde::{Deserialize, Serialize};

/// Partition used when the client doesn't name one.
pub const DEFAULT_PARTITION: &str = "posts";
/// Author used when the client doesn't name one.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// A geo-tagged post on the board. Never mutated after creation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Post {
    pub id: String,
    pub text: String,
    pub author: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub partition: String,
}

/// A validated post submission, waiting for an id.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPost {
    pub text: String,
    pub author: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub partition: String,
}

impl NewPost {
    /// Fill in the default author and partition. Empty strings count as absent.
    pub fn new(
        text: String,
        author: Option<String>,
        latitude: Option<f64>,
        longitude: Option<f64>,
        partition: Option<String>,
    ) -> Self {
        Self {
            text,
            author: author
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_owned()),
            latitude,
            longitude,
            partition: partition
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PARTITION.to_owned()),
        }
    }

    pub fn into_post(self, id: String) -> Post {
        Post {
            id,
            text: self.text,
            author: self.author,
            latitude: self.latitude,
            longitude: self.longitude,
            partition: self.partition,
        }
    }
}

/// The posts every fresh deployment starts with when seeding is switched on.
pub fn sample_posts() -> Vec<Post> {
    let sample = |id: &str, text: &str, author: &str, lat: f64, lon: f64| Post {
        id: id.to_owned(),
        text: text.to_owned(),
        author: author.to_owned(),
        latitude: Some(lat),
        longitude: Some(lon),
        partition: DEFAULT_PARTITION.to_owned(),
    };
    vec![
        sample("1", "Beautiful Milford Sound view", "Sarah", -44.6719, 168.7626),
        sample("2", "Enjoying Auckland's waterfront", "Mike", -37.0082, 174.7850),
        sample("3", "Hiking in Tongariro National Park", "Emma", -38.7870, 175.5470),
        sample("4", "Wellington's creative district", "James", -41.2865, 174.7762),
        sample("5", "Queenstown adventure capital", "Lisa", -41.3033, 168.7383),
    ]
}
