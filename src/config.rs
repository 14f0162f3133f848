use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::PathBuf;

/// Config, from a TOML file. Every field has a default, so an empty file is a valid config for
/// local development.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// <address>:<port> to serve the post board API
    pub listen_address: String,

    /// <address>:<port> to serve metrics on
    pub metrics_address: String,

    /// By default, output JSON logs. Only if this flag is set to true, output colourful human-friendly logs
    pub human_logs: bool,

    /// Max HTTP body size the API accepts
    pub max_body_size: usize,

    /// Postgres DSN for the remote post table. Unset means every request uses the in-memory store.
    /// Overridden by TABLE_CONNECTION_STRING.
    pub table_connection_string: Option<String>,

    /// Name of the remote post table. Overridden by TABLE_NAME.
    pub table_name: String,

    /// maximum number of connections maintained by the table store
    pub db_pool_size: u32,

    /// maximum seconds waiting for a database connection
    pub db_connection_timeout: u64,

    /// Shared secret for the moderation endpoints. Overridden by ADMIN_PASSWORD.
    pub admin_password: String,

    /// Directory holding reports.json, flaggedPosts.json and rateLimits.json
    pub data_dir: PathBuf,

    /// Keywords that get a post flagged as spam, checked in order.
    pub spam_keywords: Vec<String>,

    /// JSON file with more spam keywords, checked after `spam_keywords`.
    pub spam_keywords_path: Option<PathBuf>,

    /// Cap posts at one per IP per day.
    pub rate_limit_enabled: bool,

    /// Require the admin secret on GET /posts/all too.
    pub protect_all_posts: bool,

    /// Start the in-memory store with the sample posts.
    pub seed_fallback_posts: bool,
}

pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:7071".to_owned(),
            metrics_address: "127.0.0.1:9090".to_owned(),
            human_logs: false,
            max_body_size: 65536,
            table_connection_string: None,
            table_name: "GeoPosts".to_owned(),
            db_pool_size: 4,
            db_connection_timeout: 5,
            admin_password: DEFAULT_ADMIN_PASSWORD.to_owned(),
            data_dir: PathBuf::from("data"),
            spam_keywords: Vec::new(),
            spam_keywords_path: None,
            rate_limit_enabled: false,
            protect_all_posts: false,
            seed_fallback_posts: false,
        }
    }
}

impl Config {
    /// Read the file, apply environment overrides, then validate.
    pub fn from_file(filepath: &str) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(filepath)
            .with_context(|| format!("couldn't read config file {}", filepath))?;
        let mut config = Self::from_toml(&contents)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, anyhow::Error> {
        toml::from_str(contents).context("couldn't parse config file")
    }

    /// The deployment environment wins over the file for connection string, table name and secret.
    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(conn) = lookup("TABLE_CONNECTION_STRING").filter(|s| !s.is_empty()) {
            self.table_connection_string = Some(conn);
        }
        if let Some(name) = lookup("TABLE_NAME").filter(|s| !s.is_empty()) {
            self.table_name = name;
        }
        if let Some(password) = lookup("ADMIN_PASSWORD").filter(|s| !s.is_empty()) {
            self.admin_password = password;
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        // The table name ends up inside SQL as an identifier, so it can't be a bind parameter.
        let name = &self.table_name;
        if name.is_empty()
            || name.len() > 63
            || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            bail!(
                "table_name {:?} must be 1-63 ASCII letters, digits or underscores",
                name
            );
        }
        if self.admin_password.is_empty() {
            bail!("admin_password must not be empty");
        }
        Ok(())
    }

    pub fn uses_default_admin_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }

    /// Inline keywords first, then the ones from `spam_keywords_path`.
    pub fn load_spam_keywords(&self) -> Result<Vec<String>, anyhow::Error> {
        let mut keywords = self.spam_keywords.clone();
        if let Some(path) = &self.spam_keywords_path {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("couldn't read spam keywords from {}", path.display()))?;
            let from_file: Vec<String> = serde_json::from_str(&contents)
                .with_context(|| format!("{} should be a JSON list of strings", path.display()))?;
            keywords.extend(from_file);
        }
        Ok(keywords)
    }
}
