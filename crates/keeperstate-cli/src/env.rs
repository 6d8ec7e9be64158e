use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File name for the given environment: `.env` or `.env.{ENV}`.
pub fn dotenv_file_name(env: Option<&str>) -> String {
    match env {
        Some(env) => format!(".env.{}", env),
        None => ".env".to_string(),
    }
}

/// Find the closest `file_name` in `start` or any of its ancestors.
pub fn find_in_ancestors(start: &Path, file_name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(file_name))
        .find(|path| path.exists())
}

/// Load `.env` from the current directory or any parent, stopping at the
/// first one found. Returns the loaded path, or `None` if there is none.
/// A file that exists but cannot be parsed is an error.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    match find_in_ancestors(&cwd, &dotenv_file_name(None)) {
        Some(env_path) => load_file(&env_path).map(Some),
        None => Ok(None),
    }
}

/// Load `.env.{env}`, which must exist in the current directory or a parent.
pub fn require_dotenv(env: &str) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;
    let file_name = dotenv_file_name(Some(env));

    let Some(env_path) = find_in_ancestors(&cwd, &file_name) else {
        anyhow::bail!(
            "No {} file found.\n\n\
            Searched from {} to filesystem root.\n\n\
            Hint: Create one with your ClickHouse credentials:\n\
            \n  \
            CLICKHOUSE_HOST=your-instance.clickhouse.cloud\n  \
            CLICKHOUSE_PASSWORD=your-password\n\n\
            Or run 'keeperstate init' to create an example.",
            file_name,
            cwd.display()
        );
    };

    load_file(&env_path)?;
    Ok(env_path)
}

fn load_file(env_path: &Path) -> Result<PathBuf> {
    dotenvy::from_path(env_path)
        .with_context(|| format!("Failed to load {}", env_path.display()))?;
    Ok(env_path.to_path_buf())
}
