//! Lenient field deserializers for government exports.
//!
//! The same column arrives as a JSON number in one release, an ASCII string
//! in the next and a Devanagari string in a spreadsheet export.

use crate::normalize::{clean_text, parse_integer};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn integer_from_value(value: Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => parse_integer(&s),
        _ => None,
    }
}

pub fn opt_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(integer_from_value))
}

pub fn opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_integer(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}

/// Strings, numbers and blanks all collapse into a cleaned `Option<String>`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(clean_text(&s)).filter(|s| !s.is_empty()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64().map_or(false, |n| n != 0),
        Some(Value::String(s)) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "छ" | "हो"
        ),
        _ => false,
    })
}

/// A list that may be missing, `null`, a JSON array or a `;`-separated string
/// (the CSV and XLSX seeds cannot hold arrays).
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(clean_text(&s)),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(';')
            .map(clean_text)
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "super::opt_integer")]
        votes: Option<i64>,
        #[serde(default, deserialize_with = "super::opt_text")]
        name: Option<String>,
        #[serde(default, deserialize_with = "super::string_list")]
        names: Vec<String>,
        #[serde(default, deserialize_with = "super::flag")]
        source: bool,
    }

    #[test]
    fn accepts_numbers_strings_and_devanagari() {
        let row: Row = serde_json::from_str(r#"{"votes": "४०६६२", "name": 12}"#).unwrap();
        assert_eq!(row.votes, Some(40662));
        assert_eq!(row.name.as_deref(), Some("12"));

        let row: Row = serde_json::from_str(r#"{"votes": 84808.0, "name": "  "}"#).unwrap();
        assert_eq!(row.votes, Some(84808));
        assert_eq!(row.name, None);
    }

    #[test]
    fn missing_fields_default_to_none() {
        let row: Row = serde_json::from_str("{}").unwrap();
        assert_eq!(row.votes, None);
        assert!(row.names.is_empty());
        assert!(!row.source);
    }

    #[test]
    fn splits_semicolon_lists() {
        let row: Row =
            serde_json::from_str(r#"{"names": "A; B ;", "source": "yes"}"#).unwrap();
        assert_eq!(row.names, vec!["A".to_string(), "B".to_string()]);
        assert!(row.source);
    }
}
