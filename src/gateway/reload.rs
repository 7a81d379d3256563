// Master-reload cache invalidation
//
// Builds the hook the pool runtime fires when its master is asked to
// hot-reload workers. Reloaded workers re-read their business scripts, so
// any cached compiled form must be dropped first.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::runtime::ReloadHook;

/// A cache of compiled business scripts.
///
/// Host applications that precompile or memoize their handler scripts
/// implement this so a master reload can evict every tracked entry before
/// the fresh workers start.
pub trait ScriptCache: Send + Sync {
    /// Scripts currently held by the cache.
    fn tracked_scripts(&self) -> Vec<PathBuf>;

    /// Drop the cached entry for one script. Returns whether an entry
    /// existed.
    fn invalidate(&self, script: &Path) -> bool;
}

/// Build the master-reload callback for an optional script cache.
///
/// Without a cache the callback is a no-op; with one, every tracked script
/// is invalidated exactly once per reload.
pub fn build_reload_hook(cache: Option<Arc<dyn ScriptCache>>) -> ReloadHook {
    Box::new(move || {
        let Some(cache) = &cache else {
            return;
        };
        for script in cache.tracked_scripts() {
            let evicted = cache.invalidate(&script);
            debug!(script = %script.display(), evicted, "Reload invalidated cached script");
        }
    })
}
