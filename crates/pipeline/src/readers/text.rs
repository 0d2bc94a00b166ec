//! Plain text reader.

use strata_schema::Value;

const BINARY_PLACEHOLDER: &str = "<binary>";

/// Read a text file into `{content, line_count, char_count}`.
///
/// Content that is not valid UTF-8 is replaced by a `<binary>` placeholder.
pub fn read_text(content: &[u8]) -> Value {
    let text = match std::str::from_utf8(content) {
        Ok(text) => text.to_string(),
        Err(_) => BINARY_PLACEHOLDER.to_string(),
    };

    let line_count = text.lines().count() as i64;
    let char_count = text.chars().count() as i64;

    Value::map([
        ("content", Value::Text(text)),
        ("line_count", Value::Integer(line_count)),
        ("char_count", Value::Integer(char_count)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(value: &'a Value, key: &str) -> &'a Value {
        match value {
            Value::Map(fields) => &fields[key],
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_counts() {
        let value = read_text("héllo\nworld\n".as_bytes());
        assert_eq!(field(&value, "line_count"), &Value::Integer(2));
        assert_eq!(field(&value, "char_count"), &Value::Integer(12));
        assert_eq!(field(&value, "content"), &Value::from("héllo\nworld\n"));
    }

    #[test]
    fn test_empty_file() {
        let value = read_text(b"");
        assert_eq!(field(&value, "line_count"), &Value::Integer(0));
        assert_eq!(field(&value, "char_count"), &Value::Integer(0));
    }

    #[test]
    fn test_binary_placeholder() {
        let value = read_text(&[0xff, 0xfe, 0x00]);
        assert_eq!(field(&value, "content"), &Value::from("<binary>"));
        assert_eq!(field(&value, "char_count"), &Value::Integer(8));
    }
}
