#[cfg(test)]
pub mod mock;
pub mod movienight_api;
pub mod sse;

pub use movienight_api::*;
pub use sse::*;
