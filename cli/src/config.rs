use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use directories::ProjectDirs;

use mealplan_core::Planner;

/// Which catalog backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    #[default]
    Sqlite,
    Json,
}

pub struct Config {
    pub data_dir: PathBuf,
    pub store: StoreKind,
}

impl Config {
    /// Resolve the data directory (explicit path, else the platform data dir)
    /// and make sure it exists.
    pub fn load(data_dir: Option<PathBuf>, store: StoreKind) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "mealplan")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config { data_dir, store })
    }

    pub fn catalog_path(&self) -> PathBuf {
        catalog_path(&self.data_dir, self.store)
    }

    pub fn open_planner(&self) -> Result<Planner> {
        let path = self.catalog_path();
        let planner = match self.store {
            StoreKind::Sqlite => Planner::open_sqlite(&path),
            StoreKind::Json => Planner::open_json(&path),
        };
        planner.with_context(|| format!("Failed to open catalog at {}", path.display()))
    }
}

fn catalog_path(data_dir: &Path, store: StoreKind) -> PathBuf {
    match store {
        StoreKind::Sqlite => data_dir.join("mealplan.db"),
        StoreKind::Json => data_dir.join("catalog.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_data_dir_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let config = Config::load(Some(dir.clone()), StoreKind::Json).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.catalog_path(), dir.join("catalog.json"));
    }

    #[test]
    fn test_open_planner_for_each_backend() {
        let tmp = tempfile::tempdir().unwrap();
        for store in [StoreKind::Sqlite, StoreKind::Json] {
            let config = Config::load(Some(tmp.path().to_path_buf()), store).unwrap();
            let planner = config.open_planner().unwrap();
            assert_eq!(planner.list_meals().unwrap().len(), 1);
            assert!(config.catalog_path().exists());
        }
    }
}
