// tapir/src/template/mod.rs

//! Data templating: `$$name` references resolved against a variable mapping.
//!
//! Unlike text templating, evaluation works over parsed data, so a reference placed
//! alone in a string keeps the type of the value it resolves to.

pub mod eval;
pub mod parse;
pub mod path;
pub mod value;

pub use eval::{evaluate, MAX_DEPTH};
pub use parse::{has_markers, parse, Reference, Template, Token};
pub use path::{get_path, Segment};
pub use value::{TemplateFunction, TemplateValue, TemplateVars};
