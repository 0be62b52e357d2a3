use crate::core::{
    domain::TelemetryPacket,
    error::{FtpError, FtpResult},
    traits::Transport,
};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

/// Transport that hands outbound packets to an in-process channel
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<TelemetryPacket>,
}

impl ChannelTransport {
    pub fn new(outbound: mpsc::UnboundedSender<TelemetryPacket>) -> Self {
        Self { outbound }
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, packet: TelemetryPacket) -> FtpResult<()> {
        debug!(
            "Queueing message {} ({} bytes)",
            packet.message_id,
            packet.payload.len()
        );
        self.outbound
            .send(packet)
            .map_err(|_| FtpError::TransportClosed)
    }
}

/// Far end of an in-memory link: what the host sent, and a way to answer
pub struct RemoteLink {
    pub requests: mpsc::UnboundedReceiver<TelemetryPacket>,
    pub replies: mpsc::UnboundedSender<TelemetryPacket>,
}

/// Both ends of an in-memory telemetry link
pub struct LoopbackLink {
    pub transport: ChannelTransport,
    pub inbound: mpsc::UnboundedReceiver<TelemetryPacket>,
    pub remote: RemoteLink,
}

/// Create a connected host/remote pair of channels
pub fn loopback() -> LoopbackLink {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

    LoopbackLink {
        transport: ChannelTransport::new(outbound_tx),
        inbound: inbound_rx,
        remote: RemoteLink {
            requests: outbound_rx,
            replies: inbound_tx,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_carries_packets_both_ways() {
        let LoopbackLink {
            transport,
            mut inbound,
            mut remote,
        } = loopback();

        transport
            .send(TelemetryPacket::new(110, vec![1, 2, 3]))
            .await
            .unwrap();
        let seen = remote.requests.recv().await.unwrap();
        assert_eq!(seen.payload, vec![1, 2, 3]);

        remote.replies.send(TelemetryPacket::new(0, vec![9])).unwrap();
        assert_eq!(inbound.recv().await.unwrap().message_id, 0);
    }

    #[tokio::test]
    async fn test_send_after_remote_hangs_up() {
        let link = loopback();
        drop(link.remote);
        assert_eq!(
            link.transport.send(TelemetryPacket::new(110, Vec::new())).await,
            Err(FtpError::TransportClosed)
        );
    }
}
