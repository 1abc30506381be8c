// Structure Engine Module
// Schema object model, caches and the registry that owns them

pub mod cache;
pub mod error;
pub mod registry;
pub mod traits;
pub mod types;

pub use cache::{CacheSnapshot, SchemaObjectCache};
pub use error::{EngineError, EngineResult};
pub use registry::CacheRegistry;
pub use traits::SchemaSource;
pub use types::*;
