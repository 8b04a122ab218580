pub mod commands;
pub mod handlers;

pub use commands::{BuildArgs, CliArgs, Commands, DeclarationsArgs, SetupArgs};
pub use handlers::{handle_build, handle_declarations, handle_setup};
