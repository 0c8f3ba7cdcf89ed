//! Compiler: raw rules -> executable regex patterns
pub mod pattern;
pub mod compiler;

pub use self::pattern::{CompiledPattern, CompiledTechRule, CompiledRuleLibrary};
pub use self::compiler::RuleCompiler;
