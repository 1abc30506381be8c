// SPDX-License-Identifier: Apache-2.0

pub mod overlay;
pub mod store;
pub mod types;

pub use overlay::VirtualSchemaOverlay;
pub use store::{JsonOverlayStore, MemoryOverlayStore, OverlayPersistence};
pub use types::*;
