/// Collector module
///
/// This module groups all logic responsible for:
/// - Validating what the caller asked for (`request`)
/// - Driving a page source until the request is satisfied (`runner`)
///
/// The collector layer sits between:
/// - Page sources (relay, scripted test sources, ...)
/// - Result consumers (table, CSV, XLSX)
///
/// Design notes:
/// - Source-specific logic MUST NOT live here
/// - No state survives a `collect` call
pub mod request;
pub mod runner;

pub use request::CollectionRequest;
pub use runner::{CollectOptions, Collector};
