// tapir/src/template/eval.rs

//! Recursive-descent evaluation of template markers over arbitrary data.

use crate::error::{TapirError, TapirResult};
use crate::template::parse::{parse, Reference, Template, Token};
use crate::template::path::{get_path, Segment};
use crate::template::value::{TemplateValue, TemplateVars};
use futures_util::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::iter;
use tracing::{event, Level};

/// Longest chain of references followed before evaluation is considered recursive.
pub const MAX_DEPTH: usize = 100;

/// Resolves every marker in `data` against `vars`.
///
/// Sibling nodes are evaluated concurrently. Unknown references resolve to
/// `undefined`: dropped from objects, `null` in arrays and at the top level, empty
/// inside a concatenation. A reference whose resolution leads back to itself fails
/// with a `bug` error naming the chain.
pub async fn evaluate(data: &Value, vars: &TemplateVars) -> TapirResult<Value> {
  let evaluator = Evaluator { vars };
  let evaluated = evaluator.node(data, &[]).await?;
  Ok(evaluated.unwrap_or(Value::Null))
}

struct Evaluator<'v> {
  vars: &'v TemplateVars,
}

/// A reference after its top-level variable is looked up.
enum Resolved<'v> {
  /// Evaluated data, `None` meaning undefined.
  Data(Option<Value>),
  /// A helper that was not fired, possibly a namespace.
  Template(&'v TemplateValue),
}

impl<'v> Evaluator<'v> {
  fn node<'a>(&'a self, data: &'a Value, chain: &'a [String]) -> BoxFuture<'a, TapirResult<Option<Value>>> {
    async move {
      let Some(template) = parse(data) else {
        return self.children(data, chain).await;
      };
      match template {
        Template::Escaped(text) => Ok(Some(Value::String(text))),
        Template::EscapedCall(key, arg) => {
          let mut object = Map::new();
          if let Some(value) = self.node(arg, chain).await? {
            object.insert(key, value);
          }
          Ok(Some(Value::Object(object)))
        }
        Template::Single(reference) => self.reference(&reference, None, chain).await,
        Template::Call(reference, arg) => self.reference(&reference, Some(arg), chain).await,
        Template::Concat(tokens) => {
          let text = self.concat(&tokens, chain).await?;
          Ok(Some(Value::String(text)))
        }
      }
    }
    .boxed()
  }

  async fn children(&self, data: &Value, chain: &[String]) -> TapirResult<Option<Value>> {
    match data {
      Value::Object(map) => {
        let values = try_join_all(map.values().map(|value| self.node(value, chain))).await?;
        let object = map
          .keys()
          .cloned()
          .zip(values)
          .filter_map(|(key, value)| value.map(|value| (key, value)))
          .collect();
        Ok(Some(Value::Object(object)))
      }
      Value::Array(items) => {
        let values = try_join_all(items.iter().map(|item| self.node(item, chain))).await?;
        let items = values.into_iter().map(|value| value.unwrap_or(Value::Null)).collect();
        Ok(Some(Value::Array(items)))
      }
      other => Ok(Some(other.clone())),
    }
  }

  async fn reference(&self, reference: &Reference, arg: Option<&Value>, chain: &[String]) -> TapirResult<Option<Value>> {
    check_recursion(reference, chain)?;

    let Some(top) = self.vars.get(&reference.top) else {
      event!(Level::TRACE, template = %reference.name, "Unknown template reference.");
      return Ok(None);
    };

    let mut inner_chain = chain.to_vec();
    inner_chain.push(reference.top.clone());

    // `{ "$$func": arg }` receives its arguments instead of being fired right away,
    // but `{ "$$lib.func": arg }` still fires `lib` to reach `func`.
    let is_direct_call = arg.is_some() && reference.path.is_empty();
    let resolved = match top {
      TemplateValue::Data(value) => Resolved::Data(self.node(value, &inner_chain).await?),
      TemplateValue::Function { func, props } if props.is_empty() && !is_direct_call => {
        let value = func
          .call(Vec::new())
          .await
          .map_err(|err| err.with_property("template", format!("$${}", reference.name)))?;
        Resolved::Data(self.node(&value, &inner_chain).await?)
      }
      function => Resolved::Template(function),
    };

    match (arg, self.at(resolved, &reference.path, &inner_chain).await?) {
      (None, Resolved::Data(value)) => Ok(value),
      (None, Resolved::Template(value)) => self.materialize(value, &inner_chain).await.map(Some),
      (Some(arg), Resolved::Template(TemplateValue::Function { func, .. })) => {
        let args = match self.node(arg, chain).await? {
          Some(Value::Array(items)) => items,
          Some(value) => vec![value],
          None => vec![Value::Null],
        };
        event!(Level::TRACE, template = %reference.name, args = args.len(), "Firing template function.");
        // Return values of explicit calls are not evaluated again.
        func
          .call(args)
          .await
          .map(Some)
          .map_err(|err| err.with_property("template", format!("$${}", reference.name)))
      }
      (Some(_), _) => Err(
        TapirError::config(format!("Template '$${}' is not a function", reference.name))
          .with_property("template", format!("$${}", reference.name)),
      ),
    }
  }

  /// Follows `path` from a resolved reference. Namespace members are looked up by
  /// name. Anything else met along the way is evaluated first, so the rest of the
  /// path applies to evaluated data.
  async fn at(&self, resolved: Resolved<'v>, path: &[Segment], chain: &[String]) -> TapirResult<Resolved<'v>> {
    let mut current = resolved;
    for (position, segment) in path.iter().enumerate() {
      let rest = &path[position..];
      current = match current {
        Resolved::Data(value) => {
          return Ok(Resolved::Data(value.and_then(|value| get_path(&value, rest).cloned())));
        }
        Resolved::Template(TemplateValue::Data(value)) => {
          let evaluated = self.node(value, chain).await?;
          return Ok(Resolved::Data(evaluated.and_then(|value| get_path(&value, rest).cloned())));
        }
        Resolved::Template(TemplateValue::Function { func, props }) if props.is_empty() => {
          let fired = func.call(Vec::new()).await?;
          let evaluated = self.node(&fired, chain).await?;
          return Ok(Resolved::Data(evaluated.and_then(|value| get_path(&value, rest).cloned())));
        }
        Resolved::Template(TemplateValue::Function { props, .. }) => {
          let key = match segment {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
          };
          props.get(&key).map(Resolved::Template).unwrap_or(Resolved::Data(None))
        }
      };
    }
    Ok(current)
  }

  /// Turns a helper reached in value position into data: a plain helper is fired
  /// with no arguments, a namespace becomes the object of its members.
  fn materialize<'a>(&'a self, value: &'a TemplateValue, chain: &'a [String]) -> BoxFuture<'a, TapirResult<Value>> {
    async move {
      match value {
        TemplateValue::Data(data) => Ok(self.node(data, chain).await?.unwrap_or(Value::Null)),
        TemplateValue::Function { func, props } if props.is_empty() => {
          let fired = func.call(Vec::new()).await?;
          Ok(self.node(&fired, chain).await?.unwrap_or(Value::Null))
        }
        TemplateValue::Function { props, .. } => {
          let mut object = Map::new();
          for (name, prop) in props {
            object.insert(name.clone(), self.materialize(prop, chain).await?);
          }
          Ok(Value::Object(object))
        }
      }
    }
    .boxed()
  }

  async fn concat(&self, tokens: &[Token], chain: &[String]) -> TapirResult<String> {
    let parts = try_join_all(tokens.iter().map(|token| async move {
      match token {
        Token::Raw(text) => Ok(text.clone()),
        Token::Reference(reference) => self.reference(reference, None, chain).await.map(stringify),
      }
    }))
    .await?;
    Ok(parts.concat())
  }
}

fn check_recursion(reference: &Reference, chain: &[String]) -> TapirResult<()> {
  if chain.len() < MAX_DEPTH && !chain.contains(&reference.top) {
    return Ok(());
  }
  let names = chain
    .iter()
    .chain(iter::once(&reference.top))
    .map(|name| format!("$${}", name))
    .collect::<Vec<_>>();
  event!(Level::ERROR, chain = %names.join(" -> "), "Recursive template.");
  Err(
    TapirError::bug(format!("Recursive template: {}", names.join(" -> ")))
      .with_property("template", format!("$${}", reference.top)),
  )
}

/// Concatenation coerces every part to text. `undefined` and `null` are empty, strings
/// are kept as is and anything else is written as JSON.
fn stringify(value: Option<Value>) -> String {
  match value {
    None | Some(Value::Null) => String::new(),
    Some(Value::String(text)) => text,
    Some(other) => other.to_string(),
  }
}
