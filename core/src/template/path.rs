// tapir/src/template/path.rs

//! Property paths applied after a reference resolves: `$$name.sub`, `$$name[0]`,
//! `$$name["with space"]`.

use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  Key(String),
  Index(usize),
}

impl fmt::Display for Segment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Segment::Key(key) => write!(f, ".{}", key),
      Segment::Index(index) => write!(f, "[{}]", index),
    }
  }
}

/// Looks `path` up inside `value`. Arrays accept numeric keys, objects accept indices
/// as keys. A missing step yields `None`.
pub fn get_path<'v>(value: &'v Value, path: &[Segment]) -> Option<&'v Value> {
  path.iter().try_fold(value, |current, segment| step(current, segment))
}

pub(crate) fn step<'v>(value: &'v Value, segment: &Segment) -> Option<&'v Value> {
  match (value, segment) {
    (Value::Object(map), Segment::Key(key)) => map.get(key),
    (Value::Object(map), Segment::Index(index)) => map.get(&index.to_string()),
    (Value::Array(items), Segment::Index(index)) => items.get(*index),
    (Value::Array(items), Segment::Key(key)) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
    _ => None,
  }
}

pub(crate) fn is_name_start(byte: u8) -> bool {
  byte.is_ascii_alphabetic() || byte == b'_'
}

pub(crate) fn is_name_continue(byte: u8) -> bool {
  byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Scans a reference name starting at `start`: an identifier followed by any number of
/// `.ident`, `[digits]`, `["key"]` or `['key']` suffixes.
///
/// Returns the end offset, the top-level name and the path, or `None` when no
/// identifier starts at `start`.
pub(crate) fn scan_name(source: &str, start: usize) -> Option<(usize, String, Vec<Segment>)> {
  let bytes = source.as_bytes();
  if !bytes.get(start).copied().is_some_and(is_name_start) {
    return None;
  }
  let mut end = scan_ident(bytes, start);
  let top = source[start..end].to_string();
  let mut path = Vec::new();

  loop {
    match bytes.get(end) {
      Some(b'.') if bytes.get(end + 1).copied().is_some_and(is_name_start) => {
        let ident_end = scan_ident(bytes, end + 1);
        path.push(Segment::Key(source[end + 1..ident_end].to_string()));
        end = ident_end;
      }
      Some(b'[') => match scan_bracket(source, end) {
        Some((bracket_end, segment)) => {
          path.push(segment);
          end = bracket_end;
        }
        None => break,
      },
      _ => break,
    }
  }

  Some((end, top, path))
}

fn scan_ident(bytes: &[u8], start: usize) -> usize {
  let mut end = start + 1;
  while bytes.get(end).copied().is_some_and(is_name_continue) {
    end += 1;
  }
  end
}

fn scan_bracket(source: &str, open: usize) -> Option<(usize, Segment)> {
  let bytes = source.as_bytes();
  let first = *bytes.get(open + 1)?;

  if first == b'"' || first == b'\'' {
    let content_start = open + 2;
    let close = source[content_start..].find(first as char)? + content_start;
    if bytes.get(close + 1) != Some(&b']') {
      return None;
    }
    let key = source[content_start..close].to_string();
    return Some((close + 2, Segment::Key(key)));
  }

  let mut end = open + 1;
  while bytes.get(end).is_some_and(u8::is_ascii_digit) {
    end += 1;
  }
  if end == open + 1 || bytes.get(end) != Some(&b']') {
    return None;
  }
  let index = source[open + 1..end].parse().ok()?;
  Some((end + 1, Segment::Index(index)))
}
