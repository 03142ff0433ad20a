//! NPC name lists
//!
//! Tab-separated exports with a header row. The first column of every
//! non-empty line is an NPC name; names are unioned across lists,
//! deduplicated and sorted so runs process NPCs in a stable order.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read name list {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Names in one list, header skipped
pub fn parse_name_list(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split('\t').next().map(str::trim))
        .filter(|name| !name.is_empty())
}

/// Load, union and sort every configured list. Missing lists are skipped
/// with a warning.
pub async fn load_name_catalog<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<String>, CatalogError> {
    let mut names = BTreeSet::new();

    for path in paths {
        let path = path.as_ref();
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Name list {:?} not found, skipping", path);
                continue;
            }
            Err(source) => {
                return Err(CatalogError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let before = names.len();
        names.extend(parse_name_list(&content).map(str::to_string));
        info!("Read {} new names from {:?}", names.len() - before, path);
    }

    Ok(names.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_header_and_blank_lines() {
        let content = "Name\tRealm\tLevel\nAelin\tAlsius\t10\n\n  \nBorin\tIgnis\t12\n";
        let names: Vec<_> = parse_name_list(content).collect();
        assert_eq!(names, vec!["Aelin", "Borin"]);
    }

    #[test]
    fn test_parse_header_only() {
        assert_eq!(parse_name_list("Name\tRealm").count(), 0);
    }

    #[tokio::test]
    async fn test_catalog_unions_dedups_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let alsius = dir.path().join("alsius.txt");
        let ignis = dir.path().join("ignis.txt");
        std::fs::write(&alsius, "Name\tRealm\nCara\tAlsius\nAelin\tAlsius\n").unwrap();
        std::fs::write(&ignis, "Name\tRealm\nAelin\tIgnis\nBorin\tIgnis\n").unwrap();

        let catalog = load_name_catalog(&[alsius, ignis, dir.path().join("missing.txt")])
            .await
            .unwrap();
        assert_eq!(catalog, vec!["Aelin", "Borin", "Cara"]);
    }
}
