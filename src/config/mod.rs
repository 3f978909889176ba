pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::load;
pub use types::{ActionConfig, Config, GeneralConfig, GridConfig, HintsConfig, ScrollConfig};
