//! Close-once signalling primitives shared by the orchestrator and the stages:
//! stop requests, stage completion notifications, and bounded error conduits.

pub mod completion;
pub mod errors;
pub mod stop;
