use std::fs;
use std::path::{Path, PathBuf};

use sqlx::{Executor, PgPool};
use tracing::info;

use super::DatabaseError;

/// `.sql` files of a directory in lexical order
pub fn migration_files(dir: &Path) -> Result<Vec<PathBuf>, DatabaseError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| DatabaseError::Migration(format!("cannot read {}: {}", dir.display(), e)))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "sql"))
        .collect();
    files.sort();

    Ok(files)
}

/// Apply every migration in `dir`, each inside its own transaction.
///
/// Stops at the first failing file; files applied before it stay committed.
pub async fn apply_dir(pool: &PgPool, dir: &Path) -> Result<Vec<String>, DatabaseError> {
    let mut applied = Vec::new();

    for path in migration_files(dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let sql = fs::read_to_string(&path)
            .map_err(|e| DatabaseError::Migration(format!("cannot read {}: {}", name, e)))?;

        let mut tx = pool.begin().await?;
        // No bind arguments: runs over the simple query protocol, so a file may hold many statements
        (&mut *tx)
            .execute(sql.as_str())
            .await
            .map_err(|e| DatabaseError::Migration(format!("{}: {}", name, e)))?;
        tx.commit().await?;

        info!("Applied migration {}", name);
        applied.push(name);
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn lists_sql_files_in_lexical_order() {
        let dir = std::env::temp_dir().join(format!("qube-migrations-{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&dir).unwrap();
        for name in ["0002_roles.sql", "0001_profiles.sql", "README.md", "0010_seed.sql"] {
            fs::write(dir.join(name), "SELECT 1;").unwrap();
        }

        let names: Vec<String> = migration_files(&dir)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["0001_profiles.sql", "0002_roles.sql", "0010_seed.sql"]);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_directory_is_a_migration_error() {
        let err = migration_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, DatabaseError::Migration(_)));
    }
}
