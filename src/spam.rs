/// Case-insensitive keyword matching over post text and author names.
#[derive(Debug, Clone, Default)]
pub struct SpamDetector {
    /// (original keyword, lowercased keyword), in configured order.
    keywords: Vec<(String, String)>,
}

impl SpamDetector {
    /// Empty keywords are dropped; they would match every post.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k: &String| !k.is_empty())
            .map(|k| {
                let lower = k.to_lowercase();
                (k, lower)
            })
            .collect();
        Self { keywords }
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// The first configured keyword contained in `text`, if any.
    pub fn detect(&self, text: &str) -> Option<&str> {
        if text.is_empty() {
            return None;
        }
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .find(|(_, lower)| text.contains(lower.as_str()))
            .map(|(keyword, _)| keyword.as_str())
    }

    /// Check a submission. The text is checked before the author.
    pub fn check_post(&self, text: &str, author: Option<&str>) -> Option<String> {
        self.detect(text)
            .or_else(|| author.and_then(|a| self.detect(a)))
            .map(flag_reason)
    }
}

/// The reason recorded on a flag created by the detector.
pub fn flag_reason(keyword: &str) -> String {
    format!("Spam keyword detected: \"{}\"", keyword)
}
