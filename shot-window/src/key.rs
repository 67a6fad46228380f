/// Prefix shared by every counter key.
pub const KEY_PREFIX: &str = "ARRL:";

/// A stored counter that is present but does not hold an integer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CounterParseError {
    #[error("stored counter {0:?} is not an integer")]
    Malformed(String),
}

/// Map an action id to the key its counter lives under.
pub fn store_key(action_id: &str) -> String {
    let mut key = String::with_capacity(KEY_PREFIX.len() + action_id.len());
    key.push_str(KEY_PREFIX);
    key.push_str(action_id);
    key
}

/// Recover the action id from a counter key, if it carries the prefix.
pub fn action_id_of(key: &str) -> Option<&str> {
    key.strip_prefix(KEY_PREFIX)
}

/// Parse a counter read back from the store.
///
/// An absent key is a counter of zero, not an error.
pub fn parse_counter(raw: Option<&str>) -> Result<i64, CounterParseError> {
    match raw {
        None => Ok(0),
        Some(value) => value
            .parse()
            .map_err(|_| CounterParseError::Malformed(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_prefixes_action_ids() {
        assert_eq!(store_key("view-42"), "ARRL:view-42");
        assert_eq!(store_key(""), "ARRL:");
        assert_eq!(action_id_of("ARRL:view-42"), Some("view-42"));
        assert_eq!(action_id_of("other:view-42"), None);
    }

    #[test]
    fn it_parses_counters() {
        assert_eq!(parse_counter(None), Ok(0));
        assert_eq!(parse_counter(Some("17")), Ok(17));
        assert_eq!(parse_counter(Some("-3")), Ok(-3));
        assert_eq!(
            parse_counter(Some("seventeen")),
            Err(CounterParseError::Malformed("seventeen".to_string()))
        );
    }
}
