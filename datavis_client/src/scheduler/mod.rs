// src/scheduler/mod.rs
// Fixed-period tick loop: fetch → decode → ingest → render, strictly in order.
pub mod timing;

use std::future::Future;

use chrono::{DateTime, Utc};
use datavis_protocol::{decode, DecodeError, PacketLayout};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::derived::DerivedState;
use crate::errors::ClientError;
use crate::net::fetch_packet;
use crate::pipeline::PipelineState;
use crate::render::{Frame, RenderSink};
use timing::TickTiming;

/// What happened to one tick's bytes.
#[derive(Debug)]
pub enum TickOutcome {
    Rendered(Box<DerivedState>),
    /// nothing arrived (server unreachable)
    Empty,
    /// wrong size; state untouched
    Rejected(DecodeError),
    /// state advanced but the sink failed
    RenderFailed(ClientError),
}

/// Decode `bytes`, fold them into `state` and hand the frame to `sink`.
pub fn process_tick(
    state: &mut PipelineState,
    layout: &PacketLayout,
    bytes: &[u8],
    sink: &mut dyn RenderSink,
    now: DateTime<Utc>,
) -> TickOutcome {
    if bytes.is_empty() {
        return TickOutcome::Empty;
    }
    let packet = match decode(bytes, layout) {
        Ok(p) => p,
        Err(e) => return TickOutcome::Rejected(e),
    };
    let derived = state.ingest(&packet, now);
    let frame = Frame {
        state: &derived,
        history: state.history(),
        spectra: state.spectra(),
    };
    match sink.render(&frame) {
        Ok(()) => TickOutcome::Rendered(Box::new(derived)),
        Err(e) => TickOutcome::RenderFailed(e),
    }
}

/// Run until Ctrl-C.
pub async fn run(cfg: &Config, sink: &mut dyn RenderSink) {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(?e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };
    run_until(cfg, sink, shutdown).await;
    info!("shutdown signal received; exiting.");
}

/// Tick loop that stops as soon as `shutdown` resolves, including in the
/// middle of a fetch.
pub async fn run_until<F>(cfg: &Config, sink: &mut dyn RenderSink, shutdown: F) -> PipelineState
where
    F: Future<Output = ()>,
{
    let mut state = PipelineState::new(&cfg.pipeline);
    let packet_size = cfg.layout.size();

    let mut ticker = time::interval(cfg.tick);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    let mut last_start: Option<Instant> = None;

    tokio::pin!(shutdown);

    info!(
        event = "client_start",
        host = %cfg.host,
        port = cfg.port,
        layout = %cfg.layout.variant(),
        packet_size,
        tick_ms = cfg.tick.as_millis() as u64,
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        let timing = TickTiming {
            start: Instant::now(),
            period: cfg.tick,
        };
        if let Some(last) = last_start {
            debug!(
                event = "tick",
                seq = state.tick(),
                jitter_ms = format_args!("{:.3}", timing.jitter_ms(last)),
            );
        }
        last_start = Some(timing.start);

        let bytes = tokio::select! {
            _ = &mut shutdown => break,
            b = fetch_packet(&cfg.host, cfg.port, packet_size, &cfg.retry) => b,
        };

        match process_tick(&mut state, &cfg.layout, &bytes, sink, Utc::now()) {
            TickOutcome::Rendered(d) => {
                debug!(event = "tick_ok", tick = d.tick, step = d.step.unwrap_or_default());
            }
            TickOutcome::Empty => {
                warn!(event = "tick_skipped", reason = "no data");
            }
            TickOutcome::Rejected(e) => {
                warn!(
                    event = "tick_skipped",
                    reason = %e,
                    bytes = %hex::encode(&bytes[..bytes.len().min(16)]),
                );
            }
            TickOutcome::RenderFailed(e) => {
                warn!(event = "render_failed", error = %e);
            }
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::RetryPolicy;
    use crate::pipeline::PipelineConfig;
    use crate::render::SinkKind;
    use datavis_protocol::{encode, AcsMode, AttitudePacket, TelemetryPacket};
    use nalgebra::Vector3;
    use std::num::NonZeroU32;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct Recorder {
        steps: Vec<Option<u64>>,
        fail: bool,
    }

    impl RenderSink for Recorder {
        fn render(&mut self, frame: &Frame<'_>) -> Result<(), ClientError> {
            self.steps.push(frame.state.step);
            if self.fail {
                return Err(ClientError::Io(std::io::Error::other("sink closed")));
            }
            Ok(())
        }
    }

    fn packet(step: u64) -> TelemetryPacket {
        TelemetryPacket::Attitude(AttitudePacket {
            mode: AcsMode::Ready,
            step,
            b: Vector3::new(0.0, 0.0, 1.0),
            ..Default::default()
        })
    }

    #[test]
    fn wrong_size_leaves_state_alone() {
        let layout = PacketLayout::attitude();
        let mut state = PipelineState::new(&PipelineConfig::default());
        let mut sink = Recorder::default();
        let out = process_tick(&mut state, &layout, &[0u8; 46], &mut sink, Utc::now());
        assert!(matches!(
            out,
            TickOutcome::Rejected(DecodeError::SizeMismatch { expected: 64, actual: 46 })
        ));
        assert_eq!(state.tick(), 0);
        assert!(sink.steps.is_empty());
    }

    #[test]
    fn empty_read_is_skipped() {
        let layout = PacketLayout::attitude();
        let mut state = PipelineState::new(&PipelineConfig::default());
        let mut sink = Recorder::default();
        let out = process_tick(&mut state, &layout, &[], &mut sink, Utc::now());
        assert!(matches!(out, TickOutcome::Empty));
        assert_eq!(state.tick(), 0);
    }

    #[test]
    fn good_packet_renders() {
        let layout = PacketLayout::attitude();
        let bytes = encode(&packet(100), &layout).unwrap();
        let mut state = PipelineState::new(&PipelineConfig::default());
        let mut sink = Recorder::default();
        let out = process_tick(&mut state, &layout, &bytes, &mut sink, Utc::now());
        let d = match out {
            TickOutcome::Rendered(d) => d,
            other => panic!("expected a rendered frame, got {other:?}"),
        };
        assert_eq!(d.step, Some(100));
        assert_eq!(sink.steps, vec![Some(100)]);
    }

    #[test]
    fn sink_error_still_advances_state() {
        let layout = PacketLayout::attitude();
        let bytes = encode(&packet(1), &layout).unwrap();
        let mut state = PipelineState::new(&PipelineConfig::default());
        let mut sink = Recorder {
            fail: true,
            ..Default::default()
        };
        let out = process_tick(&mut state, &layout, &bytes, &mut sink, Utc::now());
        assert!(matches!(out, TickOutcome::RenderFailed(_)));
        assert_eq!(state.tick(), 1);
    }

    #[tokio::test]
    async fn loop_pulls_from_server_until_shutdown() {
        let layout = PacketLayout::attitude();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let srv_layout = layout.clone();
        tokio::spawn(async move {
            let mut step = 0u64;
            loop {
                let Ok((mut sock, _)) = listener.accept().await else { break };
                let bytes = encode(&packet(step), &srv_layout).unwrap();
                let _ = sock.write_all(&bytes).await;
                step += 1;
            }
        });

        let cfg = Config {
            host: "127.0.0.1".into(),
            port,
            layout,
            tick: Duration::from_millis(10),
            retry: RetryPolicy::bounded(NonZeroU32::new(5).unwrap(), Duration::from_millis(5)),
            pipeline: PipelineConfig::default(),
            sink: SinkKind::Console,
        };
        let mut sink = Recorder::default();
        let state = run_until(&cfg, &mut sink, time::sleep(Duration::from_millis(200))).await;

        assert!(state.tick() >= 3, "only {} ticks", state.tick());
        assert_eq!(sink.steps.len() as u64, state.tick());
        assert_eq!(sink.steps[0], Some(0));
        // one connection per packet
        assert!(sink.steps.windows(2).all(|w| w[1] > w[0]));
    }
}
