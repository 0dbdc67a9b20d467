mod generate;
mod targets;

pub use generate::cmd_generate;
pub use targets::cmd_targets;
