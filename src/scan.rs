// Interactive reconciliation session
// A barcode scanner acts as a keyboard text source, so every stdin line is a
// scanned number. The session drives the same store entry points the CLI
// subcommands use.

use std::io::{self, BufRead};
use std::path::Path;
use std::time::{Duration, Instant};

use rusqlite::Connection;

use crate::constants::SCAN_DEBOUNCE_MS;
use crate::db::schema::{self, Room};
use crate::error::Result;
use crate::report;

/// Drops a repeated identical read arriving inside the debounce window.
pub struct ScanGuard {
    last: Option<(String, Instant)>,
    window: Duration,
}

impl ScanGuard {
    pub fn new(window: Duration) -> Self {
        Self { last: None, window }
    }

    /// Whether this read should be processed.
    pub fn accept(&mut self, numero: &str, now: Instant) -> bool {
        if let Some((last, at)) = &self.last {
            if last == numero && now.duration_since(*at) < self.window {
                return false;
            }
        }
        self.last = Some((numero.to_string(), now));
        true
    }
}

enum Input {
    Refresh,
    Rooms,
    Report,
    Quit,
    Scan(String),
}

fn parse_line(line: &str) -> Input {
    match line.trim() {
        "" => Input::Refresh,
        "/salas" => Input::Rooms,
        "/relatorio" => Input::Report,
        "/sair" => Input::Quit,
        numero => Input::Scan(numero.to_string()),
    }
}

type LineSource<'a> = dyn Iterator<Item = io::Result<String>> + 'a;

/// Run the interactive session until the operator quits or input ends.
pub fn run_session(conn: &Connection, report_root: &Path) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    run_session_with(conn, report_root, &mut lines)
}

pub fn run_session_with(
    conn: &Connection,
    report_root: &Path,
    lines: &mut LineSource,
) -> Result<()> {
    loop {
        let Some(room) = select_room(conn, lines)? else {
            return Ok(());
        };
        if !scan_room(conn, &room, report_root, lines)? {
            return Ok(());
        }
    }
}

/// Room selection: a number picks from the listing, any other text filters
/// it, /sair ends the session.
fn select_room(conn: &Connection, lines: &mut LineSource) -> Result<Option<Room>> {
    let mut filter = String::new();
    loop {
        let rooms = list_rooms_filtered(conn, &filter)?;
        print_room_table(conn, &rooms)?;
        println!("Sala (número para escolher, texto para filtrar, /sair):");

        let Some(line) = lines.next().transpose()? else {
            return Ok(None);
        };
        match parse_line(&line) {
            Input::Quit => return Ok(None),
            Input::Refresh | Input::Rooms => filter.clear(),
            Input::Report => log::warn!("Escolha uma sala antes de gerar relatórios"),
            Input::Scan(text) => {
                if let Ok(index) = text.parse::<usize>() {
                    if index >= 1 && index <= rooms.len() {
                        return Ok(Some(rooms[index - 1].clone()));
                    }
                    println!("Sala {} não existe na listagem.", index);
                } else {
                    filter = text;
                }
            }
        }
    }
}

/// Scan loop for one room. Returns true to go back to room selection, false
/// to end the session.
fn scan_room(
    conn: &Connection,
    room: &Room,
    report_root: &Path,
    lines: &mut LineSource,
) -> Result<bool> {
    let mut guard = ScanGuard::new(Duration::from_millis(SCAN_DEBOUNCE_MS));

    println!("Sala: {}", room.name);
    print_counts(conn, room.id)?;
    println!("Escaneie o número do patrimônio (/salas, /relatorio, /sair):");

    loop {
        let Some(line) = lines.next().transpose()? else {
            return Ok(false);
        };
        match parse_line(&line) {
            Input::Quit => return Ok(false),
            Input::Rooms => return Ok(true),
            Input::Refresh => print_counts(conn, room.id)?,
            Input::Report => match report::generate_reports(conn, report_root) {
                Ok(()) => println!("Relatórios gerados em {}", report_root.display()),
                Err(e) => log::error!("Report generation failed: {}", e),
            },
            Input::Scan(numero) => {
                if !guard.accept(&numero, Instant::now()) {
                    continue;
                }
                // A failed scan is logged and the session keeps going.
                if let Err(e) = process_scan(conn, room, &numero) {
                    log::error!("Scan of '{}' failed: {}", numero, e);
                    continue;
                }
                print_counts(conn, room.id)?;
            }
        }
    }
}

fn process_scan(conn: &Connection, room: &Room, numero: &str) -> Result<()> {
    if schema::mark_found(conn, numero, room.id)? {
        println!("Patrimônio {} encontrado na sala {}.", numero, room.name);
    } else {
        schema::record_unfound(conn, numero, room.id)?;
        println!("Patrimônio {} não cadastrado; registro gravado.", numero);
    }
    Ok(())
}

fn list_rooms_filtered(conn: &Connection, filter: &str) -> Result<Vec<Room>> {
    let rooms = schema::list_rooms(conn)?;
    if filter.is_empty() {
        return Ok(rooms);
    }
    let needle = filter.to_lowercase();
    Ok(rooms
        .into_iter()
        .filter(|r| r.name.to_lowercase().contains(&needle))
        .collect())
}

fn print_room_table(conn: &Connection, rooms: &[Room]) -> Result<()> {
    if rooms.is_empty() {
        println!("Nenhuma sala carregada.");
        return Ok(());
    }
    for (index, room) in rooms.iter().enumerate() {
        let total = schema::count_items(conn, room.id)?;
        let found = schema::count_found(conn, room.id)?;
        println!("{:>3}. {} ({}/{})", index + 1, room.name, found, total);
    }
    Ok(())
}

fn print_counts(conn: &Connection, room_id: i64) -> Result<()> {
    let total = schema::count_items(conn, room_id)?;
    let found = schema::count_found(conn, room_id)?;
    println!("Encontrados: {}/{}", found, total);
    Ok(())
}
