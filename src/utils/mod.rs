pub mod logging;

pub use logging::{mask_username, truncate_text};
