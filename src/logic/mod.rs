//! Logic modules: translate user selections into concrete commands.
//!
//! # Modules
//!
//! - `resolver`: selection + platform to install command resolution

pub mod resolver;
