use anyhow::{anyhow, Result};
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{checksum, IcmpPacket, IcmpTypes};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::Packet;
use pnet::transport::TransportChannelType::Layer4;
use pnet::transport::TransportProtocol::Ipv4;
use pnet::transport::{icmp_packet_iter, transport_channel, TransportReceiver, TransportSender};
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

/// Echo attempts per liveness check.
pub const PING_ATTEMPTS: usize = 4;
/// Replies required to call the host up.
pub const PING_REQUIRED: usize = 2;

const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(2);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// ICMP echo header plus a small payload.
const ECHO_PACKET_LEN: usize = 16;

/// Decide whether `target` is worth scanning at all.
///
/// Sends [`PING_ATTEMPTS`] sequential echo requests, each waiting up to
/// two seconds for a matching reply, and calls the host up when at least
/// [`PING_REQUIRED`] attempts succeed. Raw ICMP needs elevated
/// privileges; if the transport channel cannot be opened, or a send or
/// receive fails, the attempt simply counts as unanswered — the check
/// degrades to "host down" rather than erroring out.
///
/// Blocking I/O throughout; call it through `spawn_blocking` from async
/// contexts.
pub fn is_host_up(target: Ipv4Addr) -> bool {
    let protocol = Layer4(Ipv4(IpNextHeaderProtocols::Icmp));
    let (mut tx, mut rx) = match transport_channel(4096, protocol) {
        Ok(channel) => channel,
        Err(e) => {
            tracing::warn!(error = %e, "cannot open ICMP channel, treating host as down");
            return false;
        }
    };

    let ident = rand::random::<u16>();
    let mut successes = 0;
    for seq in 0..PING_ATTEMPTS as u16 {
        match echo_attempt(&mut tx, &mut rx, target, ident, seq) {
            Ok(true) => successes += 1,
            Ok(false) => {}
            Err(e) => tracing::debug!(seq, error = %e, "echo attempt failed"),
        }
    }
    host_reached(successes, PING_REQUIRED)
}

fn host_reached(successes: usize, required: usize) -> bool {
    successes >= required
}

fn echo_attempt(
    tx: &mut TransportSender,
    rx: &mut TransportReceiver,
    target: Ipv4Addr,
    ident: u16,
    seq: u16,
) -> Result<bool> {
    let mut buf = [0u8; ECHO_PACKET_LEN];
    let request = build_echo_request(&mut buf, ident, seq)?;
    tx.send_to(request, IpAddr::V4(target))
        .map_err(|e| anyhow!("failed to send echo request: {e}"))?;

    let deadline = Instant::now() + ATTEMPT_TIMEOUT;
    let mut replies = icmp_packet_iter(rx);
    while Instant::now() < deadline {
        match replies.next_with_timeout(POLL_INTERVAL) {
            Ok(Some((packet, addr))) => {
                if addr != IpAddr::V4(target) || packet.get_icmp_type() != IcmpTypes::EchoReply {
                    continue;
                }
                if let Some(reply) = EchoReplyPacket::new(packet.packet()) {
                    if reply.get_identifier() == ident && reply.get_sequence_number() == seq {
                        return Ok(true);
                    }
                }
            }
            Ok(None) => continue,
            Err(e) => return Err(anyhow!("icmp receive failed: {e}")),
        }
    }
    Ok(false)
}

fn build_echo_request(buf: &mut [u8], ident: u16, seq: u16) -> Result<MutableEchoRequestPacket> {
    let mut request = MutableEchoRequestPacket::new(buf)
        .ok_or_else(|| anyhow!("echo request buffer too small"))?;
    request.set_icmp_type(IcmpTypes::EchoRequest);
    request.set_identifier(ident);
    request.set_sequence_number(seq);
    let csum = checksum(
        &IcmpPacket::new(request.packet()).ok_or_else(|| anyhow!("echo request buffer too small"))?,
    );
    request.set_checksum(csum);
    Ok(request)
}
