// tapir/src/template/value.rs

//! Values a template reference can resolve to.

use crate::error::TapirResult;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A template helper fired with the arguments of `{ "$$name": args }`, or with no
/// arguments when referenced as `$$name`.
#[async_trait]
pub trait TemplateFunction: Send + Sync {
  async fn call(&self, args: Vec<Value>) -> TapirResult<Value>;
}

struct FnTemplate<F>(F);

#[async_trait]
impl<F, Fut> TemplateFunction for FnTemplate<F>
where
  F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = TapirResult<Value>> + Send + 'static,
{
  async fn call(&self, args: Vec<Value>) -> TapirResult<Value> {
    (self.0)(args).await
  }
}

/// What a variable of the mapping holds.
#[derive(Clone)]
pub enum TemplateValue {
  /// Plain data. References inside it are evaluated when it is used.
  Data(Value),
  /// A helper. When `props` is non-empty the value is also a namespace
  /// (`$$helpers.slug`) and is never fired as a whole.
  Function {
    func: Arc<dyn TemplateFunction>,
    props: BTreeMap<String, TemplateValue>,
  },
}

impl TemplateValue {
  pub fn function(func: impl TemplateFunction + 'static) -> Self {
    TemplateValue::Function {
      func: Arc::new(func),
      props: BTreeMap::new(),
    }
  }

  /// Builds a helper from an async closure.
  pub fn from_fn<F, Fut>(f: F) -> Self
  where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TapirResult<Value>> + Send + 'static,
  {
    Self::function(FnTemplate(f))
  }

  /// Attaches a named member, turning the helper into a namespace.
  pub fn with_prop(self, name: impl Into<String>, value: TemplateValue) -> Self {
    match self {
      TemplateValue::Function { func, mut props } => {
        props.insert(name.into(), value);
        TemplateValue::Function { func, props }
      }
      data => data,
    }
  }

  pub fn is_function(&self) -> bool {
    matches!(self, TemplateValue::Function { .. })
  }
}

impl From<Value> for TemplateValue {
  fn from(value: Value) -> Self {
    TemplateValue::Data(value)
  }
}

impl fmt::Debug for TemplateValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TemplateValue::Data(value) => f.debug_tuple("Data").field(value).finish(),
      TemplateValue::Function { props, .. } => f
        .debug_struct("Function")
        .field("props", &props.keys().collect::<Vec<_>>())
        .finish(),
    }
  }
}

/// The variable mapping references resolve against, keyed by name without `$$`.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars(HashMap<String, TemplateValue>);

impl TemplateVars {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a variable. A leading `$$` in `name` is ignored.
  pub fn insert(&mut self, name: impl Into<String>, value: impl Into<TemplateValue>) {
    let name = name.into();
    let name = name.strip_prefix("$$").map(str::to_string).unwrap_or(name);
    self.0.insert(name, value.into());
  }

  pub fn with(mut self, name: impl Into<String>, value: impl Into<TemplateValue>) -> Self {
    self.insert(name, value);
    self
  }

  pub fn get(&self, name: &str) -> Option<&TemplateValue> {
    self.0.get(name)
  }

  /// Adds every variable of `other`, replacing existing ones.
  pub fn extend(&mut self, other: TemplateVars) {
    self.0.extend(other.0);
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl From<Map<String, Value>> for TemplateVars {
  fn from(map: Map<String, Value>) -> Self {
    let mut vars = TemplateVars::new();
    for (name, value) in map {
      vars.insert(name, value);
    }
    vars
  }
}
