// Reconciliation report tree
// Projects store state into per-room and aggregate CSV files. Safe to
// regenerate: prior output is removed before rewriting.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rusqlite::Connection;

use crate::constants::{
    GENERAL_REPORT_FOLDER, GENERAL_REPORT_HEADERS, LABEL_NOT_READ, LABEL_READ, REPORT_DIVERGENT,
    REPORT_FOUND, REPORT_NOT_FOUND, REPORT_UNREGISTERED, ROOM_REPORT_HEADERS,
    UNREGISTERED_GENERAL_HEADERS, UNREGISTERED_HEADERS,
};
use crate::db::schema::{self, ItemSummary};
use crate::error::Result;

#[derive(Default)]
struct RoomBuckets {
    nome: String,
    encontrados: Vec<ItemSummary>,
    nao_encontrados: Vec<ItemSummary>,
    divergentes: Vec<ItemSummary>,
    nao_cadastrados: Vec<String>,
}

/// Generate the full report tree under `report_root`.
///
/// A failure inside one room's directory is logged and skips that room only;
/// failure to prepare the aggregate directory aborts the run.
pub fn generate_reports(conn: &Connection, report_root: &Path) -> Result<()> {
    let geral_dir = report_root.join(GENERAL_REPORT_FOLDER);
    fs::create_dir_all(&geral_dir)?;

    let report_rows = schema::reconciliation_report(conn)?;
    let unfound = schema::unfound_report(conn)?;

    // Partition once, in memory. The join is ordered by room name then item
    // number, so every bucket inherits a deterministic order.
    let mut rooms: BTreeMap<i64, RoomBuckets> = BTreeMap::new();
    let mut geral_encontrados: Vec<(String, ItemSummary)> = Vec::new();
    let mut geral_nao_encontrados: Vec<(String, ItemSummary)> = Vec::new();
    let mut geral_divergentes: Vec<(String, ItemSummary)> = Vec::new();

    for row in report_rows {
        let buckets = rooms.entry(row.sala_id).or_default();
        if buckets.nome.is_empty() {
            buckets.nome = row.sala_nome.clone();
        }
        let Some(item) = row.item else {
            continue;
        };
        if item.encontrado {
            buckets.encontrados.push(item.clone());
            geral_encontrados.push((row.sala_nome.clone(), item.clone()));
        } else {
            buckets.nao_encontrados.push(item.clone());
            geral_nao_encontrados.push((row.sala_nome.clone(), item.clone()));
        }
        // Divergent: the item came from somewhere else at load time.
        if item
            .sala_id_original
            .is_some_and(|original| original != row.sala_id)
        {
            buckets.divergentes.push(item.clone());
            geral_divergentes.push((row.sala_nome.clone(), item));
        }
    }

    let mut geral_unfound: Vec<(String, String)> = Vec::new();
    for scan in unfound {
        geral_unfound.push((scan.sala_nome.clone(), scan.numero.clone()));
        if let Some(buckets) = rooms.get_mut(&scan.sala_id) {
            buckets.nao_cadastrados.push(scan.numero);
        }
    }

    write_general_reports(
        conn,
        &geral_dir,
        &geral_encontrados,
        &geral_nao_encontrados,
        &geral_divergentes,
        &geral_unfound,
    );

    for buckets in rooms.values() {
        let room_dir = report_root.join(slugify(&buckets.nome));
        if let Err(e) = write_room_reports(conn, &room_dir, buckets) {
            log::error!(
                "Skipping reports for room {} ({}): {}",
                buckets.nome,
                room_dir.display(),
                e
            );
        }
    }

    log::info!("Report tree written to {}", report_root.display());
    Ok(())
}

/// Aggregate files are written independently: a failed file is logged and
/// skipped, the rest still get written.
fn write_general_reports(
    conn: &Connection,
    geral_dir: &Path,
    encontrados: &[(String, ItemSummary)],
    nao_encontrados: &[(String, ItemSummary)],
    divergentes: &[(String, ItemSummary)],
    nao_cadastrados: &[(String, String)],
) {
    if let Err(e) = remove_stale_reports(geral_dir) {
        log::error!("Could not clear {}: {}", geral_dir.display(), e);
    }

    let files = [
        (REPORT_FOUND, encontrados, Some(LABEL_READ)),
        (REPORT_NOT_FOUND, nao_encontrados, Some(LABEL_NOT_READ)),
        (REPORT_DIVERGENT, divergentes, None),
    ];
    for (name, items, label) in files {
        let path = geral_dir.join(name);
        if let Err(e) = write_tagged_items(conn, &path, items, label) {
            log::error!("Could not write {}: {}", path.display(), e);
        }
    }

    let path = geral_dir.join(REPORT_UNREGISTERED);
    if let Err(e) = write_general_unregistered(&path, nao_cadastrados) {
        log::error!("Could not write {}: {}", path.display(), e);
    }
}

fn write_general_unregistered(path: &Path, rows: &[(String, String)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(UNREGISTERED_GENERAL_HEADERS)?;
    for (sala_nome, numero) in rows {
        writer.write_record([sala_nome.as_str(), numero.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_room_reports(conn: &Connection, room_dir: &Path, buckets: &RoomBuckets) -> Result<()> {
    fs::create_dir_all(room_dir)?;
    remove_stale_reports(room_dir)?;

    write_items(
        conn,
        &room_dir.join(REPORT_FOUND),
        &buckets.encontrados,
        Some(LABEL_READ),
    )?;
    write_items(
        conn,
        &room_dir.join(REPORT_NOT_FOUND),
        &buckets.nao_encontrados,
        Some(LABEL_NOT_READ),
    )?;
    write_items(
        conn,
        &room_dir.join(REPORT_DIVERGENT),
        &buckets.divergentes,
        None,
    )?;

    if !buckets.nao_cadastrados.is_empty() {
        let mut writer = csv::Writer::from_path(room_dir.join(REPORT_UNREGISTERED))?;
        writer.write_record(UNREGISTERED_HEADERS)?;
        for numero in &buckets.nao_cadastrados {
            writer.write_record([numero.as_str()])?;
        }
        writer.flush()?;
    }

    Ok(())
}

/// Per-room item file: the 12 shared columns, no leading room column.
fn write_items(
    conn: &Connection,
    path: &Path,
    items: &[ItemSummary],
    label_override: Option<&str>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(ROOM_REPORT_HEADERS)?;
    for item in items {
        writer.write_record(item_record(conn, item, label_override)?)?;
    }
    writer.flush()?;
    Ok(())
}

/// Aggregate item file: same columns with the current room name prepended.
fn write_tagged_items(
    conn: &Connection,
    path: &Path,
    items: &[(String, ItemSummary)],
    label_override: Option<&str>,
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(GENERAL_REPORT_HEADERS)?;
    for (sala_nome, item) in items {
        let mut record = vec![sala_nome.clone()];
        record.extend(item_record(conn, item, label_override)?);
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render one item as report columns. The found flag becomes Lido/Não Lido
/// and the original room id resolves to its display name (one point lookup
/// per row).
fn item_record(
    conn: &Connection,
    item: &ItemSummary,
    label_override: Option<&str>,
) -> Result<Vec<String>> {
    let label = match label_override {
        Some(label) => label.to_string(),
        None => if item.encontrado { LABEL_READ } else { LABEL_NOT_READ }.to_string(),
    };
    let sala_original = match item.sala_id_original {
        Some(id) => schema::room_name(conn, id)?.unwrap_or_default(),
        None => String::new(),
    };

    Ok(vec![
        item.numero.clone(),
        item.status.clone().unwrap_or_default(),
        item.ed.clone().unwrap_or_default(),
        item.descricao.clone().unwrap_or_default(),
        item.rotulos.clone().unwrap_or_default(),
        item.carga_atual.clone().unwrap_or_default(),
        item.setor_responsavel.clone().unwrap_or_default(),
        item.campus_carga.clone().unwrap_or_default(),
        item.numero_de_serie.clone().unwrap_or_default(),
        item.estado_de_conservacao.clone().unwrap_or_default(),
        label,
        sala_original,
    ])
}

/// Directory name for a room: alphanumerics, `_` and `-` kept, everything
/// else replaced with `_`.
pub fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Remove any CSV left over from a previous generation.
fn remove_stale_reports(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "csv") {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("Could not remove stale report {}: {}", path.display(), e);
            } else {
                log::debug!("Removed stale report {}", path.display());
            }
        }
    }
    Ok(())
}
