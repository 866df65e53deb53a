use std::path::{Path, PathBuf};

use storage::repository::Storage;

use crate::cli::ArgsError;

/// Open (creating if needed) and migrate the answer cache database.
pub async fn open(raw: &str) -> Result<Storage, Box<dyn std::error::Error>> {
    if raw.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: raw.to_string(),
        }
        .into());
    }
    let url = normalize_sqlite_url(raw);
    prepare_sqlite_file(&url)?;
    Ok(Storage::sqlite(&url).await?)
}

/// Accepts bare paths and `sqlite:` prefixes; returns an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// sqlx will not create the file on its own; make sure it and its parent exist.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_and_full_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///var/lib/drill.db"),
            "sqlite:///var/lib/drill.db"
        );
    }

    #[test]
    fn relative_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:cache/drill.sqlite3");
        assert!(url.starts_with("sqlite:///"), "{url}");
        assert!(url.ends_with("cache/drill.sqlite3"), "{url}");
        assert_eq!(normalize_sqlite_url("drill.sqlite3"), {
            let cwd = std::env::current_dir().unwrap();
            format!("sqlite://{}", cwd.join("drill.sqlite3").display())
        });
    }

    #[test]
    fn prepare_creates_missing_file_and_parents() {
        let dir = std::env::temp_dir().join(format!("drill-db-{}", std::process::id()));
        let file = dir.join("nested").join("cache.sqlite3");
        let url = format!("sqlite://{}", file.display());

        prepare_sqlite_file(&url).unwrap();
        assert!(file.exists());
        prepare_sqlite_file(&url).unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn prepare_rejects_non_sqlite_urls() {
        assert!(prepare_sqlite_file("postgres://localhost/x").is_err());
        assert!(prepare_sqlite_file("sqlite://").is_err());
    }
}
