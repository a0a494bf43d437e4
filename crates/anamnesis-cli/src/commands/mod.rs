//! Command implementations.

pub mod config;
pub mod deliver;
pub mod extract;
pub mod template;

pub use self::config::execute_config;
pub use self::deliver::{execute_deliver, webhook_from_config};
pub use self::extract::{execute_extract, execute_run, read_input};
pub use self::template::execute_template;
