//! Source scanning and import extraction for the Cohort engine

pub mod extractor;
pub mod inventory;
pub mod languages;
pub mod manifest;
pub mod parser_pool;


#[cfg(test)]
pub mod test_utils;

pub use extractor::SourceExtractor;
pub use inventory::{InventoryConfig, scan_inventory};
pub use languages::{LanguageExtractor, get_extractor};
pub use manifest::scan_manifests;
pub use parser_pool::{FileType, ParseRequest, ParseResult, ParserPool, create_parser_pool};
