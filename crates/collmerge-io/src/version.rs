//! Collection format and report version constants.

/// `info.schema` of collection format v2.1.
pub const COLLECTION_SCHEMA_V2_1: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// `info.schema` of collection format v2.0.
pub const COLLECTION_SCHEMA_V2_0: &str =
    "https://schema.getpostman.com/json/collection/v2.0.0/collection.json";

/// Version of the machine-readable merge report envelope (`v` field).
///
/// Bump this when report fields change meaning.
pub const REPORT_V: u8 = 1;

/// Whether a declared `info.schema` is a collection format this tool understands.
pub fn is_supported_schema(schema: &str) -> bool {
    let s = schema.trim().trim_end_matches('/');
    s == COLLECTION_SCHEMA_V2_1 || s == COLLECTION_SCHEMA_V2_0
}
