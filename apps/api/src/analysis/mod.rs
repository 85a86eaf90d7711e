//! Resume Analysis Pipeline: extract → prompt → gateway → normalize → persist.

pub mod handlers;
pub mod normalizer;
pub mod orchestrator;
pub mod prompts;
pub mod store;
