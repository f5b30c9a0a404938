// tapir/src/plugins/select.rs

//! Task key glob patterns shared by `glob`, `only` and `skip`.
//!
//! Supported syntax: `*` (any run of characters), `?` (one character), `[abc]`,
//! `[a-z]` and `[!abc]` (character classes). Anything else matches literally.

use crate::error::{TapirError, TapirResult};
use regex::Regex;
use serde_json::{json, Value};

/// Schema of `config.only` and `config.skip`: a pattern or a list of patterns.
pub(crate) fn patterns_schema() -> Value {
  json!({
    "type": ["string", "array"],
    "items": { "type": "string" },
  })
}

/// Whether `key` uses glob syntax.
pub(crate) fn is_glob(key: &str) -> bool {
  key.contains(['*', '?', '['])
}

/// Compiles a glob pattern into an anchored regex.
pub(crate) fn compile(pattern: &str) -> Result<Regex, regex::Error> {
  let mut source = String::from("^");
  let mut chars = pattern.chars().peekable();
  while let Some(c) = chars.next() {
    match c {
      '*' => source.push_str(".*"),
      '?' => source.push('.'),
      '[' => {
        let mut raw = String::from("[");
        let mut class = String::new();
        let mut closed = false;
        if chars.peek() == Some(&'!') {
          chars.next();
          raw.push('!');
          class.push('^');
        }
        for inner in chars.by_ref() {
          raw.push(inner);
          if inner == ']' {
            closed = true;
            break;
          }
          if matches!(inner, '\\' | '[' | '&' | '~') {
            class.push('\\');
          }
          class.push(inner);
        }
        if closed {
          source.push('[');
          source.push_str(&class);
          source.push(']');
        } else {
          // An unclosed class is plain text.
          source.push_str(&regex::escape(&raw));
        }
      }
      other => source.push_str(&regex::escape(&other.to_string())),
    }
  }
  source.push('$');
  Regex::new(&source)
}

/// Reads `config.<name>` as a list of compiled patterns.
pub(crate) fn patterns(value: Option<&Value>, name: &str) -> TapirResult<Vec<Regex>> {
  let sources: Vec<&str> = match value {
    None | Some(Value::Null) => Vec::new(),
    Some(Value::String(pattern)) => vec![pattern.as_str()],
    Some(Value::Array(items)) => items
      .iter()
      .map(|item| {
        item.as_str().ok_or_else(|| {
          TapirError::config(format!("'config.{}' must only contain strings", name))
            .with_property("property", format!("config.{}", name))
        })
      })
      .collect::<TapirResult<_>>()?,
    Some(other) => {
      return Err(
        TapirError::config(format!("'config.{}' must be a string or an array, not {}", name, other))
          .with_property("property", format!("config.{}", name)),
      )
    }
  };
  sources
    .into_iter()
    .map(|source| {
      compile(source).map_err(|err| {
        TapirError::config(format!("'config.{}' has an invalid pattern '{}': {}", name, source, err))
          .with_property("property", format!("config.{}", name))
          .with_property("actual", source)
      })
    })
    .collect()
}

pub(crate) fn matches_any(patterns: &[Regex], key: &str) -> bool {
  patterns.iter().any(|pattern| pattern.is_match(key))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn matches(pattern: &str, key: &str) -> bool {
    compile(pattern).unwrap().is_match(key)
  }

  #[test]
  fn wildcard_matching() {
    assert!(matches("getPets", "getPets"));
    assert!(!matches("getPets", "getPets2"));
    assert!(matches("get*", "getPets"));
    assert!(matches("*Pets", "getPets"));
    assert!(matches("g*P*s", "getPets"));
    assert!(matches("*", ""));
    assert!(!matches("a*a", "a"));
    assert!(!matches("*Pet", "getPets"));
  }

  #[test]
  fn single_characters_and_classes() {
    assert!(matches("pet?", "pets"));
    assert!(!matches("pet?", "pet"));
    assert!(matches("pet[0-9]", "pet7"));
    assert!(!matches("pet[0-9]", "petx"));
    assert!(matches("pet[!0-9]", "petx"));
    assert!(!matches("pet[!0-9]", "pet1"));
    assert!(matches("pet.get", "pet.get"));
    assert!(!matches("pet.get", "petxget"));
    assert!(matches("pet[", "pet["));
  }

  #[test]
  fn glob_detection() {
    assert!(is_glob("get*"));
    assert!(is_glob("pet?"));
    assert!(is_glob("pet[12]"));
    assert!(!is_glob("getPets"));
  }

  #[test]
  fn pattern_config_forms() {
    assert_eq!(patterns(Some(&json!(["a", "b"])), "only").unwrap().len(), 2);
    assert!(patterns(Some(&json!("a*")), "only").unwrap()[0].is_match("abc"));
    assert!(patterns(None, "only").unwrap().is_empty());
    assert!(patterns(Some(&json!(3)), "only").is_err());
    assert!(patterns(Some(&json!([1])), "only").is_err());
  }
}
