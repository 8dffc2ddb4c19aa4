// Coletor Constants
// Header and report labels are the operator-facing export labels, not
// semantic names. Do not translate or reorder them.

pub const APP_NAME: &str = "coletor";
pub const DB_FILENAME: &str = "coletor.db";
pub const REPORT_FOLDER: &str = "report";
pub const GENERAL_REPORT_FOLDER: &str = "_GERAL_";

// Import header contract: exact content, exact order.
pub const EXPECTED_COLUMNS: [&str; 18] = [
    "#",
    "NUMERO",
    "STATUS",
    "ED",
    "DESCRICAO",
    "RÓTULOS",
    "CARGA ATUAL",
    "SETOR DO RESPONSÁVEL",
    "CAMPUS DA CARGA",
    "VALOR AQUISIÇÃO",
    "VALOR DEPRECIADO",
    "NUMERO NOTA FISCAL",
    "NÚMERO DE SÉRIE",
    "DATA DA ENTRADA",
    "DATA DA CARGA",
    "FORNECEDOR",
    "SALA",
    "ESTADO DE CONSERVAÇÃO",
];

// Report file names
pub const REPORT_FOUND: &str = "encontrados.csv";
pub const REPORT_NOT_FOUND: &str = "nao_encontrados.csv";
pub const REPORT_DIVERGENT: &str = "divergente.csv";
pub const REPORT_UNREGISTERED: &str = "nao_cadastrados.csv";

// Report column headers. General files carry a leading current-room column.
pub const ROOM_REPORT_HEADERS: [&str; 12] = [
    "Número",
    "Status",
    "ED",
    "Descrição",
    "Rótulos",
    "Carga Atual",
    "Setor Responsável",
    "Campus Carga",
    "Número de Série",
    "Estado Conservação",
    "Encontrado",
    "Sala Original",
];

pub const GENERAL_REPORT_HEADERS: [&str; 13] = [
    "Sala Atual",
    "Número",
    "Status",
    "ED",
    "Descrição",
    "Rótulos",
    "Carga Atual",
    "Setor Responsável",
    "Campus Carga",
    "Número de Série",
    "Estado Conservação",
    "Encontrado",
    "Sala Original",
];

pub const UNREGISTERED_HEADERS: [&str; 1] = ["Número"];
pub const UNREGISTERED_GENERAL_HEADERS: [&str; 2] = ["Sala Atual", "Número"];

// Rendering of the found flag in reports
pub const LABEL_READ: &str = "Lido";
pub const LABEL_NOT_READ: &str = "Não Lido";

// Scanners can fake several return keys for one physical scan; identical
// reads inside this window are dropped.
pub const SCAN_DEBOUNCE_MS: u64 = 200;
