use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One discovered browser application. Listings are recomputed on demand;
/// nothing here is cached. The menu layer resolves icons from `location` at
/// render time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrowserEntry {
    pub identifier: String,
    pub display_name: String,
    pub location: PathBuf,
}

/// Application file name with the `.app` extension stripped.
pub fn display_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Listing invariants: identifiers unique case-insensitively (first
/// occurrence wins), `own_id` excluded, sorted by display name.
pub fn normalize(entries: Vec<BrowserEntry>, own_id: &str) -> Vec<BrowserEntry> {
    let mut seen = HashSet::new();
    let mut entries: Vec<BrowserEntry> = entries
        .into_iter()
        .filter(|entry| !entry.identifier.eq_ignore_ascii_case(own_id))
        .filter(|entry| seen.insert(entry.identifier.to_ascii_lowercase()))
        .collect();
    entries.sort_by_key(|entry| entry.display_name.to_lowercase());
    entries
}
