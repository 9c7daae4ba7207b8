use jsonschema::JSONSchema;
use serde_json::Value;

/// Compile the campaign schema bundled with the binary.
///
/// The schema carries all the per-field constraints (axis ranges, uniqueness,
/// required fields), so deserialisation after a successful validation can
/// only fail if the schema and the `Campaign` struct drift apart.
pub fn load_schema() -> JSONSchema {
    /// included campaign schema, self-contained (no external references)
    static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schemas/campaign.json"));
    let schema_json: Value = serde_json::from_str(SCHEMA).expect("Valid JSON");
    JSONSchema::compile(&schema_json).expect("Valid schema")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_bundled_schema_compiles() {
        load_schema();
    }

    #[test]
    fn test_rejects_out_of_range_month() {
        let schema = load_schema();
        let campaign = json!({
            "years": [2024], "months": [13], "days": [27], "hours": [6],
            "data_root": "/data/rrfs/na/prod",
            "scripts_dir": "/opt/jodiff/scripts",
            "analysis": "conv",
            "resources": { "account": "wrfruc", "partition": "batch" }
        });
        assert!(!schema.is_valid(&campaign));
    }

    #[test]
    fn test_rejects_duplicate_hours() {
        let schema = load_schema();
        let campaign = json!({
            "years": [2024], "months": [9], "days": [27], "hours": [6, 6],
            "data_root": "/data/rrfs/na/prod",
            "scripts_dir": "/opt/jodiff/scripts",
            "analysis": "conv",
            "resources": { "account": "wrfruc", "partition": "batch" }
        });
        assert!(!schema.is_valid(&campaign));
    }

    #[test]
    fn test_rejects_unknown_field() {
        let schema = load_schema();
        let campaign = json!({
            "years": [2024], "months": [9], "days": [27], "hours": [6],
            "data_root": "/data/rrfs/na/prod",
            "scripts_dir": "/opt/jodiff/scripts",
            "analysis": "conv",
            "resources": { "account": "wrfruc", "partition": "batch" },
            "dataroot": "/typo"
        });
        assert!(!schema.is_valid(&campaign));
    }

    #[test]
    fn test_rejects_missing_required_field() {
        let schema = load_schema();
        let campaign = json!({
            "years": [2024], "months": [9], "days": [27], "hours": [6],
            "data_root": "/data/rrfs/na/prod",
            "scripts_dir": "/opt/jodiff/scripts",
            "resources": { "account": "wrfruc", "partition": "batch" }
        });
        assert!(!schema.is_valid(&campaign));
    }

    #[test]
    fn test_accepts_minimal_campaign() {
        let schema = load_schema();
        let campaign = json!({
            "years": [2024], "months": [9], "days": [27], "hours": [6],
            "data_root": "/data/rrfs/na/prod",
            "scripts_dir": "/opt/jodiff/scripts",
            "analysis": "sate",
            "resources": { "account": "wrfruc", "partition": "batch" }
        });
        assert!(schema.is_valid(&campaign));
    }
}
