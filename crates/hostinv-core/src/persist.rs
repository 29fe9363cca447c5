//! Tree persistence, diffing and archiving
//!
//! A freshly computed tree only replaces the stored one when it really
//! differs; the superseded snapshot is moved into the archive first,
//! named after its modification time. Writing every run regardless would
//! blow up the archive with identical snapshots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::{debug, info, warn};

use hostinv_tree::{StructuredTree, gz_sibling};

use crate::aggregate::InventoryTrees;
use crate::config::HostInventoryConfig;
use crate::error::CoreError;

/// On-disk layout for inventory storage
#[derive(Debug, Clone)]
pub struct InventoryPaths {
    /// Canonical inventory trees, one file per host
    pub inventory_dir: PathBuf,
    /// Archived superseded snapshots, `<host>/<unix mtime>`
    pub archive_dir: PathBuf,
    /// Status-data trees, one file per host
    pub status_data_dir: PathBuf,
}

impl InventoryPaths {
    /// Conventional layout under one base directory
    #[must_use]
    pub fn under(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            inventory_dir: base.join("inventory"),
            archive_dir: base.join("inventory_archive"),
            status_data_dir: base.join("status_data"),
        }
    }
}

/// Persist `tree` for `host`, archiving the superseded snapshot
///
/// Returns the previously stored tree (empty if none existed) for change
/// messaging, or `None` when the new tree is empty and nothing is
/// retained. An unchanged tree is neither rewritten nor archived.
///
/// Callers must only invoke this when the run was safe to write; a tree
/// with sections missing due to fetch failures would otherwise be
/// mistaken for a real removal of inventory facts.
///
/// # Errors
/// Returns an error if loading, archiving or writing fails.
pub fn save_inventory_tree(
    paths: &InventoryPaths,
    host: &str,
    tree: &StructuredTree,
) -> Result<Option<StructuredTree>, CoreError> {
    fs::create_dir_all(&paths.inventory_dir)
        .map_err(|e| CoreError::storage(&paths.inventory_dir, &e))?;
    let filepath = StructuredTree::storage_path(&paths.inventory_dir, host);

    if tree.is_empty() {
        // an empty tree must not be retained
        remove_tree_files(&filepath);
        return Ok(None);
    }

    let mut old_tree = StructuredTree::load_from(&filepath)?;
    old_tree.normalize();

    if old_tree.is_equal(tree, None) {
        debug!(host = %host, "inventory unchanged");
        return Ok(Some(old_tree));
    }

    if old_tree.is_empty() {
        info!(host = %host, "new inventory tree");
    } else {
        info!(host = %host, "inventory changed, archiving previous snapshot");
        archive_previous(paths, host, &filepath)?;
    }
    tree.save_to(&paths.inventory_dir, host)?;
    Ok(Some(old_tree))
}

/// Move the stored tree into `<archive_dir>/<host>/<unix mtime>`
fn archive_previous(paths: &InventoryPaths, host: &str, filepath: &Path) -> Result<(), CoreError> {
    let metadata = fs::metadata(filepath).map_err(|e| CoreError::storage(filepath, &e))?;
    let mtime = metadata
        .modified()
        .map_err(|e| CoreError::storage(filepath, &e))?
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let arcdir = paths.archive_dir.join(host);
    fs::create_dir_all(&arcdir).map_err(|e| CoreError::storage(&arcdir, &e))?;
    let target = arcdir.join(mtime.to_string());
    fs::rename(filepath, &target).map_err(|e| CoreError::storage(filepath, &e))?;

    debug!(host = %host, archive = %target.display(), "archived previous tree");
    Ok(())
}

/// Remove the plain and compressed tree files, ignoring missing ones
fn remove_tree_files(filepath: &Path) {
    for path in [filepath.to_path_buf(), gz_sibling(filepath)] {
        if let Err(e) = fs::remove_file(&path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), error = %e, "could not remove tree file");
        }
    }
}

/// Save the freshly built status-data tree if it holds anything
///
/// # Errors
/// Returns an error if the tree cannot be written.
pub fn save_status_data_tree(
    paths: &InventoryPaths,
    host: &str,
    tree: &StructuredTree,
) -> Result<(), CoreError> {
    if tree.is_empty() {
        return Ok(());
    }
    tree.save_to(&paths.status_data_dir, host)?;
    Ok(())
}

/// Remove stored status-data files for `host`; absence is not an error
pub fn cleanup_status_data(paths: &InventoryPaths, host: &str) {
    let filepath = StructuredTree::storage_path(&paths.status_data_dir, host);
    remove_tree_files(&filepath);
}

/// Status-data lifecycle for one freshly built run
///
/// Disabled status-data inventory (and every cluster) removes any stored
/// files instead of writing new ones.
///
/// # Errors
/// Returns an error if a non-empty status tree cannot be written.
pub fn update_status_data(
    paths: &InventoryPaths,
    config: &HostInventoryConfig,
    trees: &InventoryTrees,
) -> Result<(), CoreError> {
    if config.is_cluster || !config.status_data_inventory {
        cleanup_status_data(paths, &config.name);
        return Ok(());
    }
    save_status_data_tree(paths, &config.name, &trees.status_data)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use hostinv_tree::TreePath;

    use super::*;

    fn paths() -> (tempfile::TempDir, InventoryPaths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = InventoryPaths::under(dir.path());
        (dir, paths)
    }

    fn tree_with_cores(cores: i64) -> StructuredTree {
        let mut tree = StructuredTree::new();
        tree.get_dict(&TreePath::parse("hardware.cpu"))
            .insert("cores".to_string(), Value::from(cores));
        tree.normalize();
        tree
    }

    fn archive_entries(paths: &InventoryPaths, host: &str) -> Vec<PathBuf> {
        match fs::read_dir(paths.archive_dir.join(host)) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_first_save_writes_without_archiving() {
        let (_dir, paths) = paths();
        let tree = tree_with_cores(4);

        let old = save_inventory_tree(&paths, "web01", &tree).unwrap().unwrap();
        assert!(old.is_empty());
        assert!(paths.inventory_dir.join("web01").exists());
        assert!(archive_entries(&paths, "web01").is_empty());
    }

    #[test]
    fn test_unchanged_tree_is_not_rewritten() {
        let (_dir, paths) = paths();
        let tree = tree_with_cores(4);
        save_inventory_tree(&paths, "web01", &tree).unwrap();

        // reformat the stored file; a rewrite would lose the leading space
        let filepath = paths.inventory_dir.join("web01");
        let stored = fs::read_to_string(&filepath).unwrap();
        fs::write(&filepath, format!(" {stored}")).unwrap();

        let old = save_inventory_tree(&paths, "web01", &tree).unwrap().unwrap();
        assert!(old.is_equal(&tree, None));
        assert!(fs::read_to_string(&filepath).unwrap().starts_with(' '));
        assert!(archive_entries(&paths, "web01").is_empty());
    }

    #[test]
    fn test_changed_tree_archives_the_old_snapshot() {
        let (_dir, paths) = paths();
        save_inventory_tree(&paths, "web01", &tree_with_cores(4)).unwrap();

        let filepath = paths.inventory_dir.join("web01");
        let mtime = fs::metadata(&filepath)
            .unwrap()
            .modified()
            .unwrap()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let old = save_inventory_tree(&paths, "web01", &tree_with_cores(8))
            .unwrap()
            .unwrap();
        assert!(old.is_equal(&tree_with_cores(4), None));

        let entries = archive_entries(&paths, "web01");
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].file_name().unwrap().to_string_lossy(),
            mtime.to_string()
        );

        let archived = StructuredTree::load_from(&entries[0]).unwrap();
        assert!(archived.is_equal(&tree_with_cores(4), None));

        let stored = StructuredTree::load_from(&filepath).unwrap();
        assert!(stored.is_equal(&tree_with_cores(8), None));
    }

    #[test]
    fn test_empty_tree_removes_stored_files() {
        let (_dir, paths) = paths();
        save_inventory_tree(&paths, "web01", &tree_with_cores(4)).unwrap();
        let filepath = paths.inventory_dir.join("web01");
        assert!(filepath.exists());

        let old = save_inventory_tree(&paths, "web01", &StructuredTree::new()).unwrap();
        assert!(old.is_none());
        assert!(!filepath.exists());
        assert!(!gz_sibling(&filepath).exists());
    }

    #[test]
    fn test_status_data_lifecycle() {
        let (_dir, paths) = paths();
        let mut trees = InventoryTrees::default();
        trees
            .status_data
            .get_dict(&TreePath::parse("hardware.memory"))
            .insert("free_bytes".to_string(), Value::from(42));

        let config = HostInventoryConfig::new("web01");
        update_status_data(&paths, &config, &trees).unwrap();
        let filepath = paths.status_data_dir.join("web01");
        assert!(filepath.exists());

        // disabling removes the stored files, idempotently
        let disabled = HostInventoryConfig {
            status_data_inventory: false,
            ..config
        };
        update_status_data(&paths, &disabled, &trees).unwrap();
        assert!(!filepath.exists());
        update_status_data(&paths, &disabled, &trees).unwrap();
    }

    #[test]
    fn test_empty_status_tree_writes_nothing() {
        let (_dir, paths) = paths();
        let config = HostInventoryConfig::new("web01");
        update_status_data(&paths, &config, &InventoryTrees::default()).unwrap();
        assert!(!paths.status_data_dir.join("web01").exists());
    }
}
