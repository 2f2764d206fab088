//! `squash cache`: cache maintenance.

use std::path::Path;

use squash_cache::{ArtifactCache, RawBytes};

use crate::settings::{cache_location, load_settings};
use crate::{CacheAction, GlobalArgs};

/// Runs a cache maintenance action. Returns the process exit code.
pub fn run(
    action: CacheAction,
    cache_dir: Option<&Path>,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_settings(global)?;
    let location = cache_location(&config.cache, false, cache_dir);

    match action {
        CacheAction::Dir => match location.resolve() {
            Some(dir) => println!("{}", dir.display()),
            None => println!("caching is disabled"),
        },
        CacheAction::Clear => {
            let cache: ArtifactCache<RawBytes> = ArtifactCache::new(&location);
            let removed = cache.clear()?;
            if !global.quiet {
                println!("removed {removed} cached result(s)");
            }
        }
    }
    Ok(0)
}
