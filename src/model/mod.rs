pub mod channel;
pub mod config;
pub mod hierarchy;
pub mod ids;
pub mod section;
pub mod workspace;

pub use channel::*;
pub use config::*;
pub use hierarchy::*;
pub use ids::*;
pub use section::*;
pub use workspace::*;
