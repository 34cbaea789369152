//! Payload codec: rows to and from the JSON text stored in cache fields.

use crate::data::Row;
use crate::error::Result;

/// Encodes rows as a JSON array of objects.
pub fn encode_rows(rows: &[Row]) -> Result<String> {
    Ok(serde_json::to_string(rows)?)
}

/// Decodes a payload written by [`encode_rows`].
pub fn decode_rows(payload: &str) -> Result<Vec<Row>> {
    Ok(serde_json::from_str(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use crate::error::CacheError;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::infer(v)))
            .collect()
    }

    #[test]
    fn test_mixed_types_survive() {
        let rows = vec![
            row(&[("DATE", "2015-01-01"), ("AIRLINE", "AS"), ("DELAY", "-11.0")]),
            row(&[("DATE", "2015-01-02"), ("AIRLINE", "AA"), ("DELAY", "")]),
        ];
        let decoded = decode_rows(&encode_rows(&rows).unwrap()).unwrap();
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_column_order_preserved() {
        let rows = vec![row(&[("Z", "1"), ("A", "2"), ("M", "3")])];
        let decoded = decode_rows(&encode_rows(&rows).unwrap()).unwrap();
        let columns: Vec<&str> = decoded[0].keys().map(String::as_str).collect();
        assert_eq!(columns, vec!["Z", "A", "M"]);
    }

    #[test]
    fn test_payload_shape() {
        let rows = vec![row(&[("IATA_CODE", "UA"), ("COUNT", "3")])];
        assert_eq!(
            encode_rows(&rows).unwrap(),
            r#"[{"IATA_CODE":"UA","COUNT":3}]"#
        );
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode_rows("not json");
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }
}
