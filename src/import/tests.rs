use std::io::Write as IoWrite;
use std::path::PathBuf;

use tempfile::TempDir;

use super::*;
use crate::db::schema::{self, tests::setup_test_db};

const HEADER: &str = "#,NUMERO,STATUS,ED,DESCRICAO,RÓTULOS,CARGA ATUAL,SETOR DO RESPONSÁVEL,CAMPUS DA CARGA,VALOR AQUISIÇÃO,VALOR DEPRECIADO,NUMERO NOTA FISCAL,NÚMERO DE SÉRIE,DATA DA ENTRADA,DATA DA CARGA,FORNECEDOR,SALA,ESTADO DE CONSERVAÇÃO";

/// Write an import file with the given lines under a temp dir.
fn write_csv(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(f, "{}", line).unwrap();
    }
    path
}

fn data_row(numero: &str, sala: &str) -> String {
    format!("1,{numero},ativo,ED01,Cadeira,,carga,DTI,Campus Central,150.5,120.0,NF1,S1,2020-01-01,2020-02-01,Forn,{sala},Bom")
}

#[test]
fn test_load_counts_and_original_room() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "carga.csv",
        &[
            HEADER,
            &data_row("001", "Lab 01"),
            &data_row("002", "Lab 01"),
            &data_row("003", "Almoxarifado"),
        ],
    );

    let mut conn = setup_test_db();
    let summary = load_csv(&mut conn, &path).unwrap();
    assert_eq!(summary.rooms, 2);
    assert_eq!(summary.items, 3);

    // Every item starts where the file put it.
    let rows = schema::reconciliation_report(&conn).unwrap();
    for row in rows {
        let item = row.item.expect("no room is empty in this file");
        assert!(!item.encontrado);
        assert_eq!(item.sala_id_original, Some(row.sala_id));
    }
}

#[test]
fn test_room_names_upper_cased_and_deduplicated() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "carga.csv",
        &[
            HEADER,
            &data_row("001", "lab 01"),
            &data_row("002", "LAB 01"),
            &data_row("003", "Lab 01"),
        ],
    );

    let mut conn = setup_test_db();
    let summary = load_csv(&mut conn, &path).unwrap();
    assert_eq!(summary.rooms, 1);

    let rooms = schema::list_rooms(&conn).unwrap();
    assert_eq!(rooms[0].name, "LAB 01");
    assert_eq!(rooms[0].code, room_code("LAB 01"));
}

#[test]
fn test_blank_room_means_unassigned() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "carga.csv",
        &[HEADER, &data_row("001", " "), &data_row("002", "LAB 01")],
    );

    let mut conn = setup_test_db();
    let summary = load_csv(&mut conn, &path).unwrap();
    assert_eq!(summary.rooms, 1);
    assert_eq!(summary.items, 2);

    let unassigned: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM patrimonios WHERE sala_id IS NULL AND sala_id_original IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(unassigned, 1);
}

#[test]
fn test_campus_is_lower_cased_and_values_coerced() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, "carga.csv", &[HEADER, &data_row("001", "LAB 01")]);

    let mut conn = setup_test_db();
    load_csv(&mut conn, &path).unwrap();

    let (campus, valor): (Option<String>, Option<f64>) = conn
        .query_row(
            "SELECT campus_carga, valor_aquisicao FROM patrimonios WHERE numero = '001'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(campus.as_deref(), Some("campus central"));
    assert_eq!(valor, Some(150.5));
}

#[test]
fn test_empty_fields_become_null() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "carga.csv",
        &[HEADER, "1,001,,,,,,,,,,,,,,,LAB 01,"],
    );

    let mut conn = setup_test_db();
    load_csv(&mut conn, &path).unwrap();

    let (status, valor, estado): (Option<String>, Option<f64>, Option<String>) = conn
        .query_row(
            "SELECT status, valor_aquisicao, estado_de_conservacao FROM patrimonios WHERE numero = '001'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(status, None);
    assert_eq!(valor, None);
    assert_eq!(estado, None);
}

#[test]
fn test_malformed_numeric_fails_the_load() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "carga.csv",
        &[
            HEADER,
            "1,001,,,,,,,,not-a-number,,,,,,,LAB 01,",
        ],
    );

    let mut conn = setup_test_db();
    assert!(load_csv(&mut conn, &path).is_err());
}

#[test]
fn test_bad_header_leaves_existing_data_untouched() {
    let dir = TempDir::new().unwrap();
    let good = write_csv(&dir, "good.csv", &[HEADER, &data_row("001", "LAB 01")]);
    // Same columns, first two swapped.
    let bad_header = HEADER.replacen("#,NUMERO", "NUMERO,#", 1);
    let bad = write_csv(&dir, "bad.csv", &[&bad_header, &data_row("002", "LAB 02")]);

    let mut conn = setup_test_db();
    load_csv(&mut conn, &good).unwrap();

    let err = load_csv(&mut conn, &bad).unwrap_err();
    assert!(matches!(err, ColetorError::InvalidHeader { .. }));

    // The failed load must not have cleared anything.
    let rooms = schema::list_rooms(&conn).unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].name, "LAB 01");
    let items: i64 = conn
        .query_row("SELECT COUNT(*) FROM patrimonios", [], |row| row.get(0))
        .unwrap();
    assert_eq!(items, 1);
}

#[test]
fn test_reload_replaces_everything() {
    let dir = TempDir::new().unwrap();
    let first = write_csv(&dir, "first.csv", &[HEADER, &data_row("001", "LAB 01")]);
    let second = write_csv(&dir, "second.csv", &[HEADER, &data_row("002", "LAB 02")]);

    let mut conn = setup_test_db();
    load_csv(&mut conn, &first).unwrap();
    schema::mark_found(&conn, "001", 1).unwrap();
    schema::record_unfound(&conn, "999", 1).unwrap();

    load_csv(&mut conn, &second).unwrap();

    let rooms = schema::list_rooms(&conn).unwrap();
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].name, "LAB 02");
    let scans = schema::unfound_report(&conn).unwrap();
    assert!(scans.is_empty(), "a reload clears the scan audit trail");
}
