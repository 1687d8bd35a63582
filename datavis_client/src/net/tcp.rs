// One TCP connection per packet: connect, read a fixed-size struct, close.
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tracing::{trace, warn};

use super::RetryPolicy;

/// Connect to `host:port`, retrying per `retry`. `None` once a bounded
/// policy runs out.
pub async fn connect_with_retry(host: &str, port: u16, retry: &RetryPolicy) -> Option<TcpStream> {
    let mut attempt: u32 = 0;
    loop {
        attempt = attempt.saturating_add(1);
        match TcpStream::connect((host, port)).await {
            Ok(stream) => return Some(stream),
            Err(e) => {
                trace!(event = "connect_failed", host, port, attempt, error = %e);
                if retry.exhausted(attempt) {
                    warn!(event = "connect_gave_up", host, port, attempts = attempt, error = %e);
                    return None;
                }
            }
        }
        if retry.backoff.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(retry.backoff).await;
        }
    }
}

/// Read up to `packet_size` bytes, stopping early on EOF or a read error.
/// Whatever arrived is returned.
pub async fn read_packet<R>(reader: &mut R, packet_size: usize) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; packet_size];
    let mut filled = 0;
    while filled < packet_size {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) => {
                warn!(event = "read_error", filled, expected = packet_size, error = %e);
                break;
            }
        }
    }
    if filled < packet_size {
        warn!(
            event = "short_read",
            got = filled,
            expected = packet_size,
            bytes = %hex::encode(&buf[..filled]),
        );
    }
    buf.truncate(filled);
    buf
}

/// Fetch one packet from a fresh connection. Empty when the server could
/// not be reached.
pub async fn fetch_packet(host: &str, port: u16, packet_size: usize, retry: &RetryPolicy) -> Vec<u8> {
    let Some(mut stream) = connect_with_retry(host, port, retry).await else {
        return Vec::new();
    };
    read_packet(&mut stream, packet_size).await
    // stream dropped here, closing the connection
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn serve_once(payload: Vec<u8>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(&payload).await.unwrap();
            sock.shutdown().await.unwrap();
        });
        port
    }

    #[tokio::test]
    async fn reads_full_packet() {
        let payload: Vec<u8> = (0..64).collect();
        let port = serve_once(payload.clone()).await;
        let got = fetch_packet("127.0.0.1", port, 64, &RetryPolicy::unlimited()).await;
        assert_eq!(got, payload);
    }

    #[tokio::test]
    async fn short_read_returns_partial() {
        let port = serve_once(vec![1, 2, 3]).await;
        let got = fetch_packet("127.0.0.1", port, 64, &RetryPolicy::unlimited()).await;
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn extra_bytes_are_ignored() {
        let port = serve_once(vec![7; 10]).await;
        let got = fetch_packet("127.0.0.1", port, 4, &RetryPolicy::unlimited()).await;
        assert_eq!(got, vec![7; 4]);
    }

    #[tokio::test]
    async fn bounded_retry_gives_up_on_closed_port() {
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().port()
        };
        let retry = RetryPolicy::bounded(NonZeroU32::new(2).unwrap(), Duration::from_millis(1));
        let got = fetch_packet("127.0.0.1", port, 64, &retry).await;
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn reader_stops_at_eof() {
        let mut src: &[u8] = &[9, 8];
        assert_eq!(read_packet(&mut src, 5).await, vec![9, 8]);
    }
}
