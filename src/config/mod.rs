mod r#impl;
mod structs;

pub use r#impl::{get_config, init_config, set_config_for_tests};
pub(crate) use r#impl::store_config;
pub use structs::*;
