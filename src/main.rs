// Coletor CLI binary

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use coletor::db::{self, open_db, schema};
use coletor::error::ColetorError;
use coletor::import;
use coletor::report;
use coletor::scan;

#[derive(Parser)]
#[command(name = "coletor")]
#[command(about = "Coletor - inventory reconciliation for patrimônio audits", long_about = None)]
#[command(version)]
struct Cli {
    /// Database file (defaults to the per-user data directory)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a patrimônio CSV export, replacing the current inventory
    Load {
        /// CSV file exported from the asset system
        arquivo: PathBuf,
    },

    /// List rooms with found/total counts
    Salas,

    /// List the items expected in one room
    Itens {
        /// Room id or exact room name
        sala: String,
    },

    /// Generate the reconciliation report tree
    Relatorio {
        /// Output directory (defaults to report/ under the data directory)
        #[arg(long)]
        saida: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => db::default_db_path()?,
    };
    let mut conn = open_db(&db_path)?;

    match cli.command {
        Some(Commands::Load { arquivo }) => cmd_load(&mut conn, arquivo),
        Some(Commands::Salas) => cmd_salas(&conn),
        Some(Commands::Itens { sala }) => cmd_itens(&conn, &sala),
        Some(Commands::Relatorio { saida }) => cmd_relatorio(&conn, saida),
        None => cmd_interactive(&conn),
    }
}

fn cmd_load(conn: &mut Connection, arquivo: PathBuf) -> Result<()> {
    let summary = import::load_csv(conn, &arquivo)?;

    println!("Dados carregados de {}", arquivo.display());
    println!("Itens importados: {}", summary.items);
    println!("Salas importadas: {}", summary.rooms);

    Ok(())
}

fn cmd_salas(conn: &Connection) -> Result<()> {
    let rooms = schema::list_rooms(conn)?;
    if rooms.is_empty() {
        println!("Nenhuma sala carregada. Use 'coletor load <arquivo.csv>'.");
        return Ok(());
    }

    for room in rooms {
        let total = schema::count_items(conn, room.id)?;
        let found = schema::count_found(conn, room.id)?;
        println!("{:>4}  {} ({}/{})", room.id, room.name, found, total);
    }

    Ok(())
}

fn cmd_itens(conn: &Connection, sala: &str) -> Result<()> {
    let room = resolve_room(conn, sala)?;

    for item in schema::items_in_room(conn, room.id)? {
        let flag = if item.encontrado { "x" } else { " " };
        println!(
            "[{}] {}  {}",
            flag,
            item.numero,
            item.descricao.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

fn cmd_relatorio(conn: &Connection, saida: Option<PathBuf>) -> Result<()> {
    let report_root = match saida {
        Some(path) => path,
        None => db::default_report_dir()?,
    };

    report::generate_reports(conn, &report_root)?;
    println!("Relatórios gerados em {}", report_root.display());

    Ok(())
}

fn cmd_interactive(conn: &Connection) -> Result<()> {
    let report_root = db::default_report_dir()?;
    scan::run_session(conn, &report_root)?;
    Ok(())
}

/// Room argument: a numeric id, or the exact (case-insensitive) room name.
fn resolve_room(conn: &Connection, sala: &str) -> Result<schema::Room> {
    if let Ok(id) = sala.parse::<i64>() {
        if let Some(room) = schema::get_room(conn, id)? {
            return Ok(room);
        }
    }

    schema::find_room_by_name(conn, &sala.to_uppercase())?
        .ok_or_else(|| ColetorError::RoomNotFound(sala.to_string()).into())
}
