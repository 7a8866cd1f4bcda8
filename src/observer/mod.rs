// Observer system notified after committed create/update/delete operations

pub mod error;
pub mod event;
pub mod implementations;
pub mod pipeline;
pub mod traits;

// Re-export core types
pub use error::*;
pub use event::*;
pub use implementations::*;
pub use pipeline::*;
pub use traits::*;
