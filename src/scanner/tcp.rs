use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};

use crate::scanner::results::PortStatus;

/// What went wrong while probing a single port. Every variant is local
/// to that port; none of them can affect another probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("socket setup failed: {0}")]
    Setup(#[source] io::Error),
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),
    #[error("writability wait failed: {0}")]
    Wait(#[source] io::Error),
}

/// Classify one TCP port via a non-blocking connect.
///
/// - connect completes immediately, or the socket turns writable with no
///   pending error → `Open`
/// - writable with a pending socket error (actively refused) → `Closed`
/// - nothing happens within `wait` → `Filtered`, consistent with a
///   packet filter silently dropping the SYN
/// - any setup or wait failure → `Error`
pub async fn classify(target: Ipv4Addr, port: u16, wait: Duration) -> PortStatus {
    match try_classify(target, port, wait).await {
        Ok(status) => status,
        Err(e) => {
            tracing::debug!(port, error = %e, "probe error");
            PortStatus::Error
        }
    }
}

async fn try_classify(
    target: Ipv4Addr,
    port: u16,
    wait: Duration,
) -> Result<PortStatus, ProbeError> {
    let socket =
        Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(ProbeError::Setup)?;
    socket.set_nonblocking(true).map_err(ProbeError::Setup)?;

    let addr = SocketAddr::from((target, port));
    match socket.connect(&addr.into()) {
        Ok(()) => return Ok(PortStatus::Open),
        Err(e) if connect_in_progress(&e) => {}
        Err(e) => return Err(ProbeError::Connect(e)),
    }

    let stream =
        TcpStream::from_std(std::net::TcpStream::from(socket)).map_err(ProbeError::Setup)?;

    match timeout(wait, stream.writable()).await {
        // No writability within the bound: the SYN went unanswered.
        Err(_elapsed) => Ok(PortStatus::Filtered),
        Ok(Err(e)) => Err(ProbeError::Wait(e)),
        Ok(Ok(())) => match stream.take_error().map_err(ProbeError::Wait)? {
            Some(_refused) => Ok(PortStatus::Closed),
            None => Ok(PortStatus::Open),
        },
    }
}

/// A non-blocking connect that could not finish synchronously reports
/// EINPROGRESS on Unix and WSAEWOULDBLOCK (kind WouldBlock) on Windows.
fn connect_in_progress(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    #[cfg(unix)]
    {
        e.raw_os_error() == Some(libc::EINPROGRESS)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    const LOCALHOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

    #[tokio::test]
    async fn listening_port_is_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let status = classify(LOCALHOST, port, Duration::from_secs(5)).await;
        assert_eq!(status, PortStatus::Open);
    }

    #[tokio::test]
    async fn unbound_port_is_closed() {
        // Grab a free port, then drop the listener so nothing answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let status = classify(LOCALHOST, port, Duration::from_secs(5)).await;
        assert!(matches!(status, PortStatus::Closed | PortStatus::Filtered));
    }

    #[tokio::test]
    async fn repeated_probes_agree() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let first = classify(LOCALHOST, port, Duration::from_secs(5)).await;
        let second = classify(LOCALHOST, port, Duration::from_secs(5)).await;
        assert_eq!(first, second);
    }

    #[test]
    fn would_block_counts_as_in_progress() {
        let e = io::Error::new(io::ErrorKind::WouldBlock, "in flight");
        assert!(connect_in_progress(&e));
    }

    #[cfg(unix)]
    #[test]
    fn einprogress_counts_as_in_progress() {
        let e = io::Error::from_raw_os_error(libc::EINPROGRESS);
        assert!(connect_in_progress(&e));
    }

    #[test]
    fn refused_is_not_in_progress() {
        let e = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert!(!connect_in_progress(&e));
    }
}
