//! Regular expressions as symbolic derivatives over an ordered alternation
//! algebra, with the match priorities of a backtracking engine.

pub mod alts;
pub mod ast;
pub mod builder;
pub mod context;
pub mod derivative;
pub mod display;
pub mod effects;
pub mod error;
pub mod info;
pub mod matcher;
pub mod node;
pub mod nullability;
pub mod parser;
pub mod scan;
pub mod solver;
mod stack;
pub mod subsumption;
pub mod transform;
pub mod translate;

pub use builder::{Builder, BuilderConfig, ListKind};
pub use context::{CharKind, Context};
pub use display::DisplayNode;
pub use effects::Transition;
pub use error::{Error, Result};
pub use info::RegexInfo;
pub use node::{DerivativeEffect, DerivativeEffectKind, NodeId, NodeKind, UNBOUNDED};
pub use solver::{ByteSet, ByteSetSolver, Solver};

/// Parses `pattern` and builds its node in `builder`.
pub fn compile(builder: &mut Builder<ByteSetSolver>, pattern: &str) -> Result<NodeId> {
    let ast = parser::Parser::new(pattern).parse()?;
    Ok(builder.translate(&ast))
}

/// True if `pattern` matches anywhere in `input`.
pub fn is_match(input: &[u8], pattern: &str) -> Result<bool> {
    let mut builder = Builder::new(ByteSetSolver);
    let root = compile(&mut builder, pattern)?;
    scan::Scanner::new(&mut builder, root).is_match(input)
}
