//! agentry - compile MCP server descriptors into runnable install
//! configuration and deploy agent skills across AI-agent ecosystems.
//!
//! The descriptor install path is normalizer → placeholder resolver →
//! command compiler → target adapter. The skill install path is source
//! resolver → discovery → multi-agent installer, with the uninstall policy
//! recomputed from disk when skills are removed.

pub mod adapters;
pub mod agents;
pub mod commands;
pub mod compiler;
pub mod descriptor;
pub mod error;
pub mod inputs;
pub mod paths;
pub mod placeholder;
pub mod skills;
pub mod store;

pub use error::{Error, Result};
