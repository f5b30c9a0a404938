// tapir/src/plugins/mod.rs

//! Built-in plugins.
//!
//! The core tier (`each`, `glob`, `only`, `skip`, `repeat`, `alias`, `template`,
//! `verify`, `report`) is always loaded first; the default tier (`spec`, `call`,
//! `validate`) follows. See [`crate::plugin::registry`].

pub mod alias;
pub mod call;
pub mod each;
pub mod glob;
pub mod only;
pub mod repeat;
pub mod report;
pub(crate) mod select;
pub mod skip;
pub mod spec;
pub mod template;
pub mod validate;
pub mod verify;

pub use alias::AliasPlugin;
pub use call::CallPlugin;
pub use each::EachPlugin;
pub use glob::GlobPlugin;
pub use only::OnlyPlugin;
pub use repeat::RepeatPlugin;
pub use report::ReportPlugin;
pub use skip::SkipPlugin;
pub use spec::SpecPlugin;
pub use template::TemplatePlugin;
pub use validate::ValidatePlugin;
pub use verify::VerifyPlugin;
