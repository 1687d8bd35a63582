use std::io::Write;

use super::{Frame, RenderSink};
use crate::errors::ClientError;

/// Streams each derived state as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderSink for JsonLinesSink<W> {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), ClientError> {
        serde_json::to_writer(&mut self.out, frame.state)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PipelineConfig, PipelineState};
    use chrono::Utc;
    use datavis_protocol::{AcsMode, AttitudePacket, TelemetryPacket};
    use nalgebra::Vector3;

    #[test]
    fn one_object_per_line() {
        let mut state = PipelineState::new(&PipelineConfig::default());
        let pkt = TelemetryPacket::Attitude(AttitudePacket {
            mode: AcsMode::Detumble,
            step: 7,
            b: Vector3::new(0.0, 1.0, 0.0),
            ..Default::default()
        });
        let mut sink = JsonLinesSink::new(Vec::new());
        for _ in 0..2 {
            let derived = state.ingest(&pkt, Utc::now());
            let frame = Frame {
                state: &derived,
                history: state.history(),
                spectra: state.spectra(),
            };
            sink.render(&frame).unwrap();
        }
        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let v: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(v["tick"], 1);
        assert_eq!(v["step"], 7);
        // undefined W/B angle serialises as null
        assert!(v["rate_field_angle_deg"].is_null());
        assert!(v["field"]["norm"].as_f64().is_some());
    }
}
