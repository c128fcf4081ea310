//! Skill deployment: source resolution, discovery, multi-agent install, and
//! the uninstall policy.

pub mod discovery;
pub mod installer;
pub mod policy;
pub mod source;
