// Database schema types and query helpers

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::error::Result;

// ----- Room -----

#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub code: String,
}

pub fn insert_room(conn: &Connection, id: i64, name: &str, code: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO salas (id, sala, codigo) VALUES (?1, ?2, ?3)",
        params![id, name, code],
    )?;
    Ok(())
}

/// All rooms, alphabetical by display name.
pub fn list_rooms(conn: &Connection) -> Result<Vec<Room>> {
    let mut stmt = conn.prepare("SELECT id, sala, codigo FROM salas ORDER BY sala")?;

    let rooms = stmt
        .query_map([], |row| {
            Ok(Room {
                id: row.get(0)?,
                name: row.get(1)?,
                code: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rooms)
}

pub fn room_name(conn: &Connection, room_id: i64) -> Result<Option<String>> {
    let result = conn
        .query_row(
            "SELECT sala FROM salas WHERE id = ?1",
            params![room_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(result)
}

pub fn get_room(conn: &Connection, id: i64) -> Result<Option<Room>> {
    let result = conn
        .query_row(
            "SELECT id, sala, codigo FROM salas WHERE id = ?1",
            params![id],
            |row| {
                Ok(Room {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    code: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(result)
}

pub fn find_room_by_name(conn: &Connection, name: &str) -> Result<Option<Room>> {
    let result = conn
        .query_row(
            "SELECT id, sala, codigo FROM salas WHERE sala = ?1",
            params![name],
            |row| {
                Ok(Room {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    code: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(result)
}

// ----- Item -----

/// A full item row as loaded from the import file. The descriptive fields are
/// pass-through and never interpreted.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub numero: String,
    pub status: Option<String>,
    pub ed: Option<String>,
    pub descricao: Option<String>,
    pub rotulos: Option<String>,
    pub carga_atual: Option<String>,
    pub setor_responsavel: Option<String>,
    pub campus_carga: Option<String>,
    pub valor_aquisicao: Option<f64>,
    pub valor_depreciado: Option<f64>,
    pub numero_nota_fiscal: Option<String>,
    pub numero_de_serie: Option<String>,
    pub data_da_entrada: Option<String>,
    pub data_da_carga: Option<String>,
    pub fornecedor: Option<String>,
    pub sala_id: Option<i64>,
    pub estado_de_conservacao: Option<String>,
}

/// Projection of an item as the session and the reports need it.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSummary {
    pub numero: String,
    pub status: Option<String>,
    pub ed: Option<String>,
    pub descricao: Option<String>,
    pub rotulos: Option<String>,
    pub carga_atual: Option<String>,
    pub setor_responsavel: Option<String>,
    pub campus_carga: Option<String>,
    pub numero_de_serie: Option<String>,
    pub estado_de_conservacao: Option<String>,
    pub encontrado: bool,
    pub sala_id_original: Option<i64>,
}

fn map_item_summary(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<ItemSummary> {
    Ok(ItemSummary {
        numero: row.get(offset)?,
        status: row.get(offset + 1)?,
        ed: row.get(offset + 2)?,
        descricao: row.get(offset + 3)?,
        rotulos: row.get(offset + 4)?,
        carga_atual: row.get(offset + 5)?,
        setor_responsavel: row.get(offset + 6)?,
        campus_carga: row.get(offset + 7)?,
        numero_de_serie: row.get(offset + 8)?,
        estado_de_conservacao: row.get(offset + 9)?,
        encontrado: row.get(offset + 10)?,
        sala_id_original: row.get(offset + 11)?,
    })
}

const ITEM_SUMMARY_COLUMNS: &str = "p.numero, p.status, p.ed, p.descricao, p.rotulos, p.carga_atual,
        p.setor_responsavel, p.campus_carga, p.numero_de_serie,
        p.estado_de_conservacao, p.encontrado, p.sala_id_original";

/// Items expected in one room, natural row order.
pub fn items_in_room(conn: &Connection, room_id: i64) -> Result<Vec<ItemSummary>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_SUMMARY_COLUMNS} FROM patrimonios p WHERE p.sala_id = ?1"
    ))?;

    let items = stmt
        .query_map(params![room_id], |row| map_item_summary(row, 0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(items)
}

/// Mark the item with the given number as found in `room_id`.
///
/// Duplicate numbers resolve to the first item by insertion order. Before the
/// move, an unset sala_id_original is backfilled from the current room so the
/// divergence test keeps working for legacy rows. Returns false when no item
/// carries the number.
pub fn mark_found(conn: &Connection, numero: &str, room_id: i64) -> Result<bool> {
    let result: Option<(i64, Option<i64>, Option<i64>)> = conn
        .query_row(
            "SELECT id, sala_id, sala_id_original
             FROM patrimonios
             WHERE numero = ?1
             ORDER BY id
             LIMIT 1",
            params![numero],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let Some((item_id, current_room, original_room)) = result else {
        return Ok(false);
    };

    if original_room.is_none() {
        conn.execute(
            "UPDATE patrimonios SET sala_id_original = ?1 WHERE id = ?2",
            params![current_room, item_id],
        )?;
    }

    let updated = conn.execute(
        "UPDATE patrimonios SET sala_id = ?1, encontrado = 1 WHERE id = ?2",
        params![room_id, item_id],
    )?;
    Ok(updated > 0)
}

/// Record a scan that matched no item. Always appends; identical scans are an
/// intentional audit trail.
pub fn record_unfound(conn: &Connection, numero: &str, room_id: i64) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO patrimonios_nao_cadastrados (numero, sala_id) VALUES (?1, ?2)",
        params![numero, room_id],
    )?;
    Ok(inserted > 0)
}

pub fn count_items(conn: &Connection, room_id: i64) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patrimonios WHERE sala_id = ?1",
        params![room_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn count_found(conn: &Connection, room_id: i64) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM patrimonios WHERE sala_id = ?1 AND encontrado = 1",
        params![room_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ----- Reconciliation -----

/// One row of the reconciliation join. Rooms with no items appear once with
/// `item` set to None.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub sala_id: i64,
    pub sala_nome: String,
    pub item: Option<ItemSummary>,
}

pub fn reconciliation_report(conn: &Connection) -> Result<Vec<ReportRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT s.id, s.sala, {ITEM_SUMMARY_COLUMNS}
         FROM salas s
         LEFT JOIN patrimonios p ON s.id = p.sala_id
         ORDER BY s.sala, p.numero"
    ))?;

    let rows = stmt
        .query_map([], |row| {
            let numero: Option<String> = row.get(2)?;
            let item = match numero {
                Some(_) => Some(map_item_summary(row, 2)?),
                None => None,
            };
            Ok(ReportRow {
                sala_id: row.get(0)?,
                sala_nome: row.get(1)?,
                item,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// An unregistered scan joined with the room it happened in.
#[derive(Debug, Clone)]
pub struct UnfoundScan {
    pub sala_id: i64,
    pub sala_nome: String,
    pub numero: String,
}

pub fn unfound_report(conn: &Connection) -> Result<Vec<UnfoundScan>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.sala, u.numero
         FROM patrimonios_nao_cadastrados u
         JOIN salas s ON u.sala_id = s.id
         ORDER BY s.sala, u.numero",
    )?;

    let scans = stmt
        .query_map([], |row| {
            Ok(UnfoundScan {
                sala_id: row.get(0)?,
                sala_nome: row.get(1)?,
                numero: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(scans)
}
