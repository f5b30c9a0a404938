// tapir/src/template/parse.rs

//! Detection of template markers inside data.
//!
//! A run of `$` directly followed by a name is a marker. Two or three `$` make a
//! reference (the extra `$` stays literal). Four or more make an escape: two `$` are
//! removed and the rest is kept as text, so `$$$$name` reads as the literal `$$name`.

use crate::template::path::{scan_name, Segment};
use serde_json::Value;

/// A `$$name` reference with its optional property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
  /// Source text of the reference without the leading `$$`, e.g. `user.pets[0]`.
  pub name: String,
  /// Variable looked up in the mapping.
  pub top: String,
  pub path: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
  Raw(String),
  Reference(Reference),
}

/// A template marker found at one node of the data.
#[derive(Debug, Clone, PartialEq)]
pub enum Template<'a> {
  /// A string that is exactly one reference.
  Single(Reference),
  /// `{ "$$name": arg }`.
  Call(Reference, &'a Value),
  /// A string embedding references among text.
  Concat(Vec<Token>),
  /// A string whose only markers are escapes, already unescaped.
  Escaped(String),
  /// `{ "$$$$name": arg }`, with the key already unescaped.
  EscapedCall(String, &'a Value),
}

enum Piece {
  Raw(String),
  Escape(String),
  Reference(Reference),
}

/// Returns the marker at `value`, or `None` if the node is plain data.
pub fn parse(value: &Value) -> Option<Template<'_>> {
  match value {
    Value::String(text) => parse_string(text),
    Value::Object(map) if map.len() == 1 => {
      let (key, arg) = map.iter().next()?;
      match parse_string(key)? {
        Template::Single(reference) => Some(Template::Call(reference, arg)),
        Template::Escaped(key) => Some(Template::EscapedCall(key, arg)),
        _ => None,
      }
    }
    _ => None,
  }
}

/// Whether `value` or anything below it carries a marker.
pub fn has_markers(value: &Value) -> bool {
  if parse(value).is_some() {
    return true;
  }
  match value {
    Value::Object(map) => map.values().any(has_markers),
    Value::Array(items) => items.iter().any(has_markers),
    _ => false,
  }
}

fn parse_string(text: &str) -> Option<Template<'static>> {
  let pieces = tokenize(text);

  let references = pieces.iter().filter(|piece| matches!(piece, Piece::Reference(_))).count();
  let escapes = pieces.iter().filter(|piece| matches!(piece, Piece::Escape(_))).count();

  if references == 0 {
    if escapes == 0 {
      return None;
    }
    let unescaped = pieces
      .into_iter()
      .map(|piece| match piece {
        Piece::Raw(text) | Piece::Escape(text) => text,
        Piece::Reference(reference) => reference.name,
      })
      .collect();
    return Some(Template::Escaped(unescaped));
  }

  if pieces.len() == 1 {
    if let Some(Piece::Reference(reference)) = pieces.into_iter().next() {
      return Some(Template::Single(reference));
    }
    return None;
  }

  let mut tokens: Vec<Token> = Vec::with_capacity(pieces.len());
  for piece in pieces {
    match piece {
      Piece::Reference(reference) => tokens.push(Token::Reference(reference)),
      Piece::Raw(text) | Piece::Escape(text) => match tokens.last_mut() {
        Some(Token::Raw(previous)) => previous.push_str(&text),
        _ => tokens.push(Token::Raw(text)),
      },
    }
  }
  Some(Template::Concat(tokens))
}

fn tokenize(text: &str) -> Vec<Piece> {
  let bytes = text.as_bytes();
  let mut pieces = Vec::new();
  let mut raw_start = 0;
  let mut cursor = 0;

  while cursor < bytes.len() {
    if bytes[cursor] != b'$' {
      cursor += 1;
      continue;
    }

    let dollars_start = cursor;
    while bytes.get(cursor) == Some(&b'$') {
      cursor += 1;
    }
    let dollars = cursor - dollars_start;
    if dollars < 2 {
      continue;
    }

    let Some((name_end, top, path)) = scan_name(text, cursor) else {
      continue;
    };

    // Any `$` beyond the two of the marker is plain text.
    let marker_start = dollars_start + dollars - 2;
    if marker_start > raw_start {
      pieces.push(Piece::Raw(text[raw_start..marker_start].to_string()));
    }

    let name = text[cursor..name_end].to_string();
    if dollars >= 4 {
      pieces.push(Piece::Escape(name));
    } else {
      pieces.push(Piece::Reference(Reference { name, top, path }));
    }

    cursor = name_end;
    raw_start = cursor;
  }

  if raw_start < bytes.len() {
    pieces.push(Piece::Raw(text[raw_start..].to_string()));
  }
  pieces
}
