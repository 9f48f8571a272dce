//! Action dispatcher: turn a decoded payload into its side effect.
//!
//! `FILE` writes the embedded data; `HTTP` fetches the URL first. The
//! network client is injected behind [`Fetcher`] so the core never owns
//! one. No retries; partial writes are not cleaned up.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::payload::Payload;

/// Boxed error from a fetch implementation.
pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// One outbound GET; the response body becomes the file content.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("failed to write {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("fetch of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("refusing filename {0:?}: path separators or parent components")]
    UnsafeFilename(String),
}

/// Outcome of a successful dispatch.
#[derive(Debug, PartialEq, Eq)]
pub struct DispatchReport {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Writes decoded frames into a working directory.
pub struct Dispatcher<F> {
    out_dir: PathBuf,
    fetcher: F,
}

impl<F: Fetcher> Dispatcher<F> {
    pub fn new(out_dir: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            out_dir: out_dir.into(),
            fetcher,
        }
    }

    /// Perform the payload's side effect. Exactly one file is written per
    /// successful call.
    pub fn dispatch(&self, payload: &Payload) -> Result<DispatchReport, DispatchError> {
        match payload {
            Payload::File { filename, data } => self.persist(filename, data),
            Payload::Http { filename, url } => {
                let body = self
                    .fetcher
                    .fetch(url)
                    .map_err(|source| DispatchError::Fetch {
                        url: url.clone(),
                        source,
                    })?;
                self.persist(filename, &body)
            }
        }
    }

    fn persist(&self, filename: &str, data: &[u8]) -> Result<DispatchReport, DispatchError> {
        // Received filenames are untrusted; keep them inside out_dir.
        let name = Path::new(filename);
        let safe = name.components().count() == 1
            && matches!(name.components().next(), Some(Component::Normal(_)));
        if !safe {
            return Err(DispatchError::UnsafeFilename(filename.to_owned()));
        }

        let path = self.out_dir.join(name);
        fs::write(&path, data).map_err(|source| DispatchError::Persistence {
            path: path.clone(),
            source,
        })?;
        info!("written `{}` ({} bytes)", path.display(), data.len());
        Ok(DispatchReport {
            path,
            bytes: data.len(),
        })
    }
}
