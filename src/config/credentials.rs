use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

pub const TOKEN_ENV: &str = "MURMUR_TOKEN";

/// Where the bearer token comes from. Obtaining the token is the login
/// screen's business; this only reads what it persisted.
#[derive(Debug, Clone, Default)]
pub struct TokenSource {
    file: Option<PathBuf>,
}

impl TokenSource {
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    /// Resolve the token: environment first, then the configured file,
    /// then `<data dir>/murmur/token`.
    pub fn load(&self) -> Option<String> {
        if let Ok(token) = env::var(TOKEN_ENV) {
            if let Some(token) = clean(&token) {
                debug!("Using token from {}", TOKEN_ENV);
                return Some(token);
            }
        }

        let path = self.file.clone().or_else(default_token_path)?;
        read_token_file(&path)
    }
}

fn default_token_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("murmur").join("token"))
}

fn read_token_file(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => clean(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No token file at {}", path.display());
            None
        }
        Err(e) => {
            warn!("Failed to read token file {}: {}", path.display(), e);
            None
        }
    }
}

fn clean(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
