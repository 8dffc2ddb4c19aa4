// CSV bulk import
// Destructively replaces the store contents from a patrimônio export file.

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rusqlite::{params, Connection};
use serde::Deserialize;

use crate::constants::EXPECTED_COLUMNS;
use crate::db::schema::{insert_room, NewItem};
use crate::error::{ColetorError, Result};

/// One data row of the import file, bound by the operator-facing export
/// labels. Empty fields deserialize to None; a malformed numeric value fails
/// the whole load.
#[derive(Debug, Deserialize)]
struct ImportRow {
    #[serde(rename = "#")]
    _seq: Option<String>,
    #[serde(rename = "NUMERO")]
    numero: String,
    #[serde(rename = "STATUS")]
    status: Option<String>,
    #[serde(rename = "ED")]
    ed: Option<String>,
    #[serde(rename = "DESCRICAO")]
    descricao: Option<String>,
    #[serde(rename = "RÓTULOS")]
    rotulos: Option<String>,
    #[serde(rename = "CARGA ATUAL")]
    carga_atual: Option<String>,
    #[serde(rename = "SETOR DO RESPONSÁVEL")]
    setor_responsavel: Option<String>,
    #[serde(rename = "CAMPUS DA CARGA")]
    campus_carga: Option<String>,
    #[serde(rename = "VALOR AQUISIÇÃO")]
    valor_aquisicao: Option<f64>,
    #[serde(rename = "VALOR DEPRECIADO")]
    valor_depreciado: Option<f64>,
    #[serde(rename = "NUMERO NOTA FISCAL")]
    numero_nota_fiscal: Option<String>,
    #[serde(rename = "NÚMERO DE SÉRIE")]
    numero_de_serie: Option<String>,
    #[serde(rename = "DATA DA ENTRADA")]
    data_da_entrada: Option<String>,
    #[serde(rename = "DATA DA CARGA")]
    data_da_carga: Option<String>,
    #[serde(rename = "FORNECEDOR")]
    fornecedor: Option<String>,
    #[serde(rename = "SALA")]
    sala: Option<String>,
    #[serde(rename = "ESTADO DE CONSERVAÇÃO")]
    estado_de_conservacao: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadSummary {
    pub rooms: usize,
    pub items: usize,
}

/// Content code for a room name. Collisions between distinct names are a
/// fatal data error, not silently ignored.
pub fn room_code(name: &str) -> String {
    blake3::hash(name.as_bytes()).to_hex().to_string()
}

/// Replace the store contents from the CSV at `path`.
///
/// The whole file is validated and parsed before any mutation, and the
/// destructive clear shares a transaction with the inserts: a malformed file
/// leaves existing data untouched.
pub fn load_csv(conn: &mut Connection, path: &Path) -> Result<LoadSummary> {
    let mut reader = csv::Reader::from_path(path)?;
    validate_header(reader.headers()?)?;

    let rows: Vec<ImportRow> = reader
        .deserialize()
        .collect::<std::result::Result<_, _>>()?;

    // Distinct upper-cased room names, ids assigned in first-appearance order.
    let mut rooms: Vec<(String, String)> = Vec::new();
    let mut room_ids: HashMap<String, i64> = HashMap::new();
    let mut seen_codes: HashSet<String> = HashSet::new();
    for row in &rows {
        if let Some(name) = normalize_room_name(row.sala.as_deref()) {
            if room_ids.contains_key(&name) {
                continue;
            }
            let code = room_code(&name);
            if !seen_codes.insert(code.clone()) {
                return Err(ColetorError::CodeCollision(name));
            }
            let id = rooms.len() as i64 + 1;
            room_ids.insert(name.clone(), id);
            rooms.push((name, code));
        }
    }

    let items: Vec<NewItem> = rows
        .into_iter()
        .map(|row| {
            let sala_id = normalize_room_name(row.sala.as_deref())
                .and_then(|name| room_ids.get(&name).copied());
            NewItem {
                numero: row.numero,
                status: row.status,
                ed: row.ed,
                descricao: row.descricao,
                rotulos: row.rotulos,
                carga_atual: row.carga_atual,
                setor_responsavel: row.setor_responsavel,
                campus_carga: row.campus_carga.map(|c| c.to_lowercase()),
                valor_aquisicao: row.valor_aquisicao,
                valor_depreciado: row.valor_depreciado,
                numero_nota_fiscal: row.numero_nota_fiscal,
                numero_de_serie: row.numero_de_serie,
                data_da_entrada: row.data_da_entrada,
                data_da_carga: row.data_da_carga,
                fornecedor: row.fornecedor,
                sala_id,
                estado_de_conservacao: row.estado_de_conservacao,
            }
        })
        .collect();

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM patrimonios", [])?;
    tx.execute("DELETE FROM patrimonios_nao_cadastrados", [])?;
    tx.execute("DELETE FROM salas", [])?;
    for (name, code) in &rooms {
        insert_room(&tx, room_ids[name], name, code)?;
    }
    insert_items(&tx, &items)?;
    tx.commit()?;

    log::info!(
        "Loaded {} items across {} rooms from {}",
        items.len(),
        rooms.len(),
        path.display()
    );

    Ok(LoadSummary {
        rooms: rooms.len(),
        items: items.len(),
    })
}

/// Bulk-insert items with load-time reconciliation state: not yet found, and
/// the original room equal to the current room.
pub fn insert_items(conn: &Connection, items: &[NewItem]) -> Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO patrimonios (
            numero, status, ed, descricao, rotulos, carga_atual,
            setor_responsavel, campus_carga, valor_aquisicao, valor_depreciado,
            numero_nota_fiscal, numero_de_serie, data_da_entrada, data_da_carga,
            fornecedor, sala_id, estado_de_conservacao, encontrado, sala_id_original
         )
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, 0, ?16)",
    )?;
    for item in items {
        stmt.execute(params![
            item.numero,
            item.status,
            item.ed,
            item.descricao,
            item.rotulos,
            item.carga_atual,
            item.setor_responsavel,
            item.campus_carga,
            item.valor_aquisicao,
            item.valor_depreciado,
            item.numero_nota_fiscal,
            item.numero_de_serie,
            item.data_da_entrada,
            item.data_da_carga,
            item.fornecedor,
            item.sala_id,
            item.estado_de_conservacao,
        ])?;
    }
    Ok(items.len())
}

fn validate_header(headers: &csv::StringRecord) -> Result<()> {
    let found: Vec<&str> = headers.iter().collect();
    if found != EXPECTED_COLUMNS {
        return Err(ColetorError::InvalidHeader {
            expected: EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            found: found.into_iter().map(|c| c.to_string()).collect(),
        });
    }
    Ok(())
}

/// Upper-cased room name; blank or whitespace-only means unassigned.
fn normalize_room_name(sala: Option<&str>) -> Option<String> {
    sala.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_uppercase())
}
