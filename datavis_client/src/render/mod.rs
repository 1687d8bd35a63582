//! Presentation seam. The pipeline hands each sink a read-only [`Frame`];
//! sinks draw or emit it but can never touch the history windows.

pub mod console;
pub mod json;

pub use console::ConsoleSink;
pub use json::JsonLinesSink;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::derived::DerivedState;
use crate::errors::ClientError;
use crate::history::HistoryStore;
use crate::spectral::Spectrum;

#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub state: &'a DerivedState,
    pub history: &'a HistoryStore,
    pub spectra: &'a [Spectrum; 3],
}

pub trait RenderSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), ClientError>;
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), ClientError> {
        (**self).render(frame)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Console,
    Json,
}

/// Sink writing to the process's stdout/log.
pub fn build_sink(kind: SinkKind) -> Box<dyn RenderSink> {
    match kind {
        SinkKind::Console => Box::new(ConsoleSink::default()),
        SinkKind::Json => Box::new(JsonLinesSink::new(std::io::stdout())),
    }
}
