//! CLI command implementations: thin presentation over the library modules.

pub mod agents;
pub mod mcp;
pub mod skill;
