pub mod enums;
pub mod error;
pub mod structs;
pub mod ticker;

// Re-export the core types to provide a clean public API.
pub use enums::Field;
pub use error::CoreError;
pub use structs::{Quote, RawResponse, RawTable};
pub use ticker::TickerSet;
