pub mod autoplay;
pub mod stdio;

pub use autoplay::{AutoplayMode, AutoplaySettings};
pub use stdio::StdioMode;
