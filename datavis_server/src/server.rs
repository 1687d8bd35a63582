// Accept loop: wait for the next control step, hand one packet to one
// client, close.
use std::io;
use std::net::SocketAddr;

use datavis_protocol::{encode, PacketLayout};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::sim::TelemetrySource;

pub const LISTEN_BACKLOG: i32 = 32;

/// Listener with `SO_REUSEADDR` so restarts don't trip over TIME_WAIT.
pub fn bind_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    TcpListener::from_std(socket.into())
}

/// Produce one packet per `period` and publish it as the latest value.
pub async fn run_simulation(
    mut source: Box<dyn TelemetrySource>,
    layout: PacketLayout,
    period: Duration,
    tx: watch::Sender<Vec<u8>>,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    // prime
    ticker.tick().await;
    let mut last_start = Instant::now();

    loop {
        ticker.tick().await;
        let start = Instant::now();
        let seq = source.step();
        let packet = source.next_packet();

        let bytes = match encode(&packet, &layout) {
            Ok(b) => b,
            Err(e) => {
                warn!(event = "encode_failed", seq, error = %e);
                continue;
            }
        };

        let actual_ms = start.duration_since(last_start).as_secs_f64() * 1000.0;
        let ideal_ms = period.as_secs_f64() * 1000.0;
        let w = packet.rate();
        info!(
            event = "sim_sample",
            kind = %packet.variant(),
            seq,
            mode = packet.mode().map(|m| m.label()).unwrap_or("-"),
            w_z = format_args!("{:.3}", w.z),
            len = bytes.len(),
            actual_ms = format_args!("{:.3}", actual_ms),
            ideal_ms = format_args!("{:.3}", ideal_ms),
        );
        last_start = start;

        tx.send_replace(bytes);
        if tx.is_closed() {
            debug!("no subscribers left; simulation stopping");
            break;
        }
    }
}

/// One connection per fresh packet. Returns when the publisher goes away.
pub async fn serve(listener: TcpListener, mut rx: watch::Receiver<Vec<u8>>) {
    loop {
        if rx.changed().await.is_err() {
            break;
        }
        let (mut sock, peer) = match listener.accept().await {
            Ok(c) => c,
            Err(e) => {
                warn!(event = "accept_failed", error = %e);
                continue;
            }
        };
        let bytes = rx.borrow_and_update().clone();
        match sock.write_all(&bytes).await {
            Ok(()) => debug!(event = "packet_sent", %peer, len = bytes.len()),
            Err(e) => warn!(event = "send_failed", %peer, error = %e),
        }
        let _ = sock.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datavis_client::net::{fetch_packet, RetryPolicy};
    use datavis_protocol::decode;
    use std::num::NonZeroU32;

    use crate::sim::{build_source, SimParams};

    #[tokio::test]
    async fn one_packet_per_connection() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = watch::channel(Vec::new());
        tokio::spawn(serve(listener, rx));

        let retry = RetryPolicy::bounded(NonZeroU32::new(10).unwrap(), Duration::from_millis(5));
        tx.send_replace(vec![1, 2, 3, 4]);
        assert_eq!(fetch_packet("127.0.0.1", port, 4, &retry).await, vec![1, 2, 3, 4]);
        tx.send_replace(vec![5, 6, 7, 8]);
        assert_eq!(fetch_packet("127.0.0.1", port, 4, &retry).await, vec![5, 6, 7, 8]);
    }

    #[tokio::test]
    async fn rebind_after_close() {
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        assert!(bind_listener(addr).is_ok());
    }

    #[tokio::test]
    async fn simulated_feed_decodes_on_the_client() {
        let layout = PacketLayout::attitude();
        let listener = bind_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = watch::channel(Vec::new());
        let source = build_source(layout.variant(), &SimParams::default()).unwrap();
        tokio::spawn(run_simulation(source, layout.clone(), Duration::from_millis(10), tx));
        tokio::spawn(serve(listener, rx));

        let retry = RetryPolicy::bounded(NonZeroU32::new(50).unwrap(), Duration::from_millis(10));
        let bytes = fetch_packet("127.0.0.1", port, layout.size(), &retry).await;
        let pkt = decode(&bytes, &layout).unwrap();
        assert!(pkt.step().is_some());
    }
}
