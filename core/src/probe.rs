//! PATH lookups for the package runner and installer.

use std::path::PathBuf;

use crate::host::BoxFut;

/// Resolve `program` on the search path without blocking the async thread.
pub(crate) async fn resolve(program: &str) -> Option<PathBuf> {
    let owned = program.to_string();
    match tokio::task::spawn_blocking(move || which::which(owned)).await {
        Ok(Ok(path)) => {
            tracing::debug!("{program} resolved to {}", path.display());
            Some(path)
        }
        Ok(Err(e)) => {
            tracing::debug!("{program} not found in PATH: {e}");
            None
        }
        Err(e) => {
            tracing::warn!("PATH lookup for {program} did not complete: {e}");
            None
        }
    }
}

/// Answers "can `program` be found on the search path?".
pub trait PathProbe: Send + Sync {
    fn is_reachable<'a>(&'a self, program: &'a str) -> BoxFut<'a, bool>;
}

/// [`PathProbe`] backed by `which`, run off the async thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhichProbe;

impl PathProbe for WhichProbe {
    fn is_reachable<'a>(&'a self, program: &'a str) -> BoxFut<'a, bool> {
        Box::pin(async move { resolve(program).await.is_some() })
    }
}
