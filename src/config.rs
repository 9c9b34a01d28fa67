use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::storage::StoreOptions;

/// Directory holding a project's database, relative to the project root
pub const PROJECT_DIR: &str = ".kgmem";
pub const DATABASE_FILE: &str = "memory.db";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct KgmemConfig {
    pub database: Option<String>,
    pub busy_timeout_ms: Option<u64>,
}

impl KgmemConfig {
    pub fn store_options(&self) -> StoreOptions {
        match self.busy_timeout_ms {
            Some(ms) => StoreOptions { busy_timeout: Duration::from_millis(ms) },
            None => StoreOptions::default(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("kgmem.toml")
}

/// Scoped database for a project directory
pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(PROJECT_DIR).join(DATABASE_FILE)
}

/// Global database under the user's home directory, falling back to the
/// current directory when no home is known
pub fn global_database_path() -> PathBuf {
    let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    default_database_path_in(&base)
}

/// Pick the database: explicit flag/env, then config file, then global default
pub fn resolve_database_path(explicit: Option<&Path>, config: Option<&KgmemConfig>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(db) = config.and_then(|c| c.database.as_deref()) {
        return PathBuf::from(db);
    }
    global_database_path()
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<KgmemConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: KgmemConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &KgmemConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = format!("{}/", PROJECT_DIR);

    let mut content = String::new();
    if gitignore_path.exists() {
        content = std::fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(&entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}
