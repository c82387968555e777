pub mod config;
pub mod error;
pub mod theme;
pub mod types;

pub use config::Config;
pub use error::RelatiqError;
pub use theme::{Theme, ThemeSlot};
pub use types::*;
