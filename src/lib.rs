//! Compiles AFCL workflow documents into enactment graphs: flat, bipartite
//! dependency graphs of typed data nodes and function nodes.

pub mod compiler;
pub mod dsl;
pub mod error;
pub mod graph;
pub mod io;

pub use compiler::core::Compiler;
pub use error::{CompileError, Result};
pub use graph::EnactmentGraph;
