pub mod merge;
pub mod status;
pub mod sync;

pub use merge::merge;
pub use status::status;
pub use sync::sync;
