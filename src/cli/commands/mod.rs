//! One module per subcommand.

pub mod change_password;
pub mod clear;
pub mod completions;
pub mod create;
pub mod destroy;
pub mod mount;
pub mod pass;
pub mod status;
pub mod unmount;
