//! Command implementations for the LZHX CLI.

pub mod auto;
pub mod create;
pub mod extract;
pub mod list;

pub use auto::cmd_auto;
pub use create::cmd_create;
pub use extract::cmd_extract;
pub use list::{ListOptions, cmd_list};
pub use test::cmd_test;
