//! Slug derivation and collision avoidance.

use tracing::debug;

use medialib_core::result::AppResult;
use medialib_core::types::FolderId;
use medialib_database::FolderRepository;

/// Base slug used when a name contains no ASCII letters or digits.
pub const FALLBACK_SLUG: &str = "folder";

/// Derive a lowercase, hyphenated slug from a folder name.
///
/// ASCII letters and digits are kept, runs of any other separator
/// collapse into a single `-`, apostrophes and non-ASCII letters vanish.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if matches!(c, '\'' | '\u{2019}') || c.is_alphanumeric() {
            continue;
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Find the first free slug for `name`: the base slug, then `base-1`, `base-2`, ...
///
/// `exclude` names a folder whose current slug does not count as taken,
/// so renaming a folder never collides with itself.
pub async fn unique_slug(
    repo: &dyn FolderRepository,
    name: &str,
    exclude: Option<FolderId>,
) -> AppResult<String> {
    let base = slugify(name);
    if !repo.slug_exists(&base, exclude).await? {
        return Ok(base);
    }

    let mut suffix: u64 = 1;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !repo.slug_exists(&candidate, exclude).await? {
            debug!(base = %base, slug = %candidate, "Slug collision resolved with suffix");
            return Ok(candidate);
        }
        suffix += 1;
    }
}
