// Database migrations
// Migrations are forward-only. Never edit or delete a migration after it ships.

use anyhow::Result;
use rusqlite::Connection;

/// All migrations in order. Each migration is a SQL string.
const MIGRATIONS: &[&str] = &[
    // Migration 1: Initial schema
    r#"
    -- Rooms, bulk-created at import. codigo is a content hash of the name,
    -- kept as a secondary uniqueness guard.
    CREATE TABLE salas (
        id INTEGER PRIMARY KEY,
        sala TEXT NOT NULL UNIQUE,
        codigo TEXT NOT NULL UNIQUE
    );

    -- Inventory items. All descriptive fields are nullable pass-through from
    -- the import file and never interpreted. numero is NOT unique.
    CREATE TABLE patrimonios (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        numero TEXT NOT NULL,
        status TEXT,
        ed TEXT,
        descricao TEXT,
        rotulos TEXT,
        carga_atual TEXT,
        setor_responsavel TEXT,
        campus_carga TEXT,
        valor_aquisicao REAL,
        valor_depreciado REAL,
        numero_nota_fiscal TEXT,
        numero_de_serie TEXT,
        data_da_entrada TEXT,
        data_da_carga TEXT,
        fornecedor TEXT,
        sala_id INTEGER REFERENCES salas(id),
        estado_de_conservacao TEXT
    );

    -- Scans that matched no item. Append-only audit trail; duplicates are
    -- intentional.
    CREATE TABLE patrimonios_nao_cadastrados (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        numero TEXT NOT NULL,
        sala_id INTEGER REFERENCES salas(id)
    );

    CREATE INDEX idx_patrimonios_numero ON patrimonios(numero);
    CREATE INDEX idx_patrimonios_sala ON patrimonios(sala_id);
    CREATE INDEX idx_nao_cadastrados_sala ON patrimonios_nao_cadastrados(sala_id);
    "#,
    // Migration 2: Reconciliation columns (additive). sala_id_original is set
    // once and never cleared; encontrado is never reset outside a full reload.
    r#"
    ALTER TABLE patrimonios ADD COLUMN encontrado INTEGER NOT NULL DEFAULT 0;
    ALTER TABLE patrimonios ADD COLUMN sala_id_original INTEGER REFERENCES salas(id);

    UPDATE patrimonios
    SET sala_id_original = sala_id
    WHERE sala_id_original IS NULL;
    "#,
];

/// Get current schema version from database
fn get_schema_version(conn: &Connection) -> Result<u32> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Run all pending migrations (crash-safe)
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    let target_version = MIGRATIONS.len() as u32;

    // Refuse to open a DB created by a newer build
    if current_version > target_version {
        anyhow::bail!(
            "Database schema version {} is newer than this build supports (max {}). Please upgrade Coletor.",
            current_version,
            target_version
        );
    }

    if current_version == target_version {
        return Ok(());
    }

    // Apply pending migrations one-by-one
    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let migration_version = (i + 1) as u32;
        if migration_version <= current_version {
            continue;
        }

        conn.execute_batch(migration)?;
        conn.execute_batch(&format!("PRAGMA user_version = {}", migration_version))?;

        log::info!("Applied migration {}", migration_version);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_init() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();

        run_migrations(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'
                 AND name IN ('salas','patrimonios','patrimonios_nao_cadastrados')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3, "All 3 tables should exist");

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_v1_upgrade_backfills_original_room() {
        let conn = Connection::open_in_memory().unwrap();

        // Bring the schema to version 1 only, then seed a legacy row.
        conn.execute_batch(MIGRATIONS[0]).unwrap();
        conn.execute_batch("PRAGMA user_version = 1").unwrap();
        conn.execute(
            "INSERT INTO salas (id, sala, codigo) VALUES (1, 'LAB 01', 'abc')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO patrimonios (numero, sala_id) VALUES ('001', 1)",
            [],
        )
        .unwrap();

        run_migrations(&conn).unwrap();

        let (encontrado, original): (i64, Option<i64>) = conn
            .query_row(
                "SELECT encontrado, sala_id_original FROM patrimonios WHERE numero = '001'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(encontrado, 0);
        assert_eq!(original, Some(1), "upgrade should backfill sala_id_original");
    }
}
