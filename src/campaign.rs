//! Campaign configuration: which cycles to analyse and how to run them

/// Typed campaign configuration deserialised from a JSON file
pub mod config;
/// Enumerate the campaign's date axes into concrete cycles
pub mod cycle;
/// Compile the bundled campaign JSON schema
pub mod schema;
