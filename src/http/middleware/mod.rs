pub mod versioning;

pub use versioning::{versioning_middleware, InvalidVersionHandler, VersioningState};
