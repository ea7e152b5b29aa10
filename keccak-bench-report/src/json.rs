//! JSON Output

use crate::report::CandidateResult;

/// Serialize results as a pretty-printed JSON array, preserving order.
///
/// An absent checksum is written as `null`.
pub fn generate_json_report(results: &[CandidateResult]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_array() {
        assert_eq!(generate_json_report(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_fields_and_null_checksum() {
        let results = vec![
            CandidateResult {
                implementation: "tiny-keccak".to_string(),
                seconds: 0.25,
                hashes_per_second: 409_600.0,
                checksum: Some(17),
            },
            CandidateResult {
                implementation: "mojo (compiled)".to_string(),
                seconds: 0.5,
                hashes_per_second: 204_800.0,
                checksum: None,
            },
        ];
        let json = generate_json_report(&results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["implementation"], "tiny-keccak");
        assert_eq!(value[0]["checksum"], 17);
        assert_eq!(value[1]["implementation"], "mojo (compiled)");
        assert!(value[1]["checksum"].is_null());
        assert_eq!(value[1]["hashes_per_second"], 204_800.0);
    }
}
