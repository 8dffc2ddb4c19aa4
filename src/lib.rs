// Coletor - Library Entry Point

pub mod constants;
pub mod error;
pub mod db;
pub mod import;
pub mod report;
pub mod scan;
