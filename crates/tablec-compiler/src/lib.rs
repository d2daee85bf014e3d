//! # tablec-compiler
//!
//! The compilation pipeline of the tablec table compiler: reads a tree
//! of `.xlsx` workbooks, parses their `#`-marked header rows into typed
//! schemas, and emits per-platform proto3 schema text, serialized data
//! blobs and C# accessor source.
//!
//! [`Compiler`] is the entry point:
//!
//! ```no_run
//! use tablec_compiler::{Compiler, Config};
//!
//! # fn main() -> tablec_compiler::Result<()> {
//! let config = Config::load("tablec.json")?;
//! Compiler::new(config).run()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod emit;
pub mod error;
pub mod kinds;
pub mod orchestrator;
pub mod parser;
pub mod protoc;
pub mod wire;

pub use config::{Config, HookConfig, TargetConfig};
pub use error::{CompileError, Result};
pub use kinds::{classify, TableKind};
pub use orchestrator::Compiler;
