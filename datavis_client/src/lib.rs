// Ground-side DataVis client: pull one packet per tick, derive attitude /
// orbit state, hand each frame to a render sink.
pub mod config;
pub mod derived;
pub mod errors;
pub mod history;
pub mod net;
pub mod pipeline;
pub mod render;
pub mod scheduler;
pub mod spectral;

pub use errors::ClientError;
pub use pipeline::{PipelineConfig, PipelineState};
