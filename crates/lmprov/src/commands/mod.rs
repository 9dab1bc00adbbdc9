//! Command handlers: bridge CLI args to the provisioner and output formatting.

pub mod run;
pub mod util;
pub mod validate;
