use super::events::{ResponseRouter, log_dispatch};
use crate::core::{
    domain::{RetryPolicy, TargetAddress, TelemetryPacket},
    error::{FtpError, FtpResult},
    traits::Transport,
};
use crate::file_transfer::{FileTransferMessage, FtpPayload};
use crate::protocol::FILE_TRANSFER_PROTOCOL_ID;
use crate::protocol::opcode::describe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

/// Turns the shared, lossy packet stream into one retrying request/response call.
///
/// The correlator sits in the inbound path: every packet is inspected, file
/// transfer responses are routed to the in-flight request, and every packet
/// (file transfer or not) is forwarded unchanged to the downstream receiver.
pub struct Correlator {
    transport: Arc<dyn Transport>,
    router: Arc<ResponseRouter>,
    target: TargetAddress,
    tap: JoinHandle<()>,
}

impl Correlator {
    /// Insert the correlator into the inbound path.
    ///
    /// Returns the correlator and the receiver downstream consumers read from.
    pub fn attach(
        transport: Arc<dyn Transport>,
        inbound: mpsc::UnboundedReceiver<TelemetryPacket>,
        target: TargetAddress,
    ) -> (Self, mpsc::UnboundedReceiver<TelemetryPacket>) {
        let router = Arc::new(ResponseRouter::new());
        let (downstream_tx, downstream_rx) = mpsc::unbounded_channel();

        let tap = tokio::spawn(Self::run_tap(inbound, downstream_tx, router.clone()));

        (
            Self {
                transport,
                router,
                target,
                tap,
            },
            downstream_rx,
        )
    }

    pub fn target(&self) -> TargetAddress {
        self.target
    }

    /// True while the inbound stream is still being observed
    pub fn is_attached(&self) -> bool {
        !self.tap.is_finished()
    }

    /// Inbound tap: observe, route, pass through
    async fn run_tap(
        mut inbound: mpsc::UnboundedReceiver<TelemetryPacket>,
        downstream: mpsc::UnboundedSender<TelemetryPacket>,
        router: Arc<ResponseRouter>,
    ) {
        while let Some(packet) = inbound.recv().await {
            if packet.message_id == FILE_TRANSFER_PROTOCOL_ID {
                match FileTransferMessage::decode(&packet.payload) {
                    Ok(message) => {
                        let seq = message.payload.seq;
                        log_dispatch(router.dispatch(message.payload), seq);
                    }
                    Err(e) => warn!("Dropping undecodable file transfer message: {}", e),
                }
            }

            // A consumer that hung up does not stop the tap.
            let _ = downstream.send(packet);
        }

        debug!("Inbound stream closed");
        router.close();
    }

    /// Send `request` and wait for its response, resending the identical
    /// packet on timeout or transmit failure until the budget is spent.
    pub async fn exchange(&self, request: &FtpPayload, policy: &RetryPolicy) -> FtpResult<FtpPayload> {
        let opcode = request.opcode;
        let packet = FileTransferMessage::new(self.target, request.clone()).into_packet()?;
        let mut in_flight = self.router.register(request)?;

        let started = Instant::now();
        let mut attempts = 0;

        while attempts < policy.max_attempts {
            let wait = match policy.deadline {
                Some(deadline) => {
                    let elapsed = started.elapsed();
                    if elapsed >= deadline {
                        return Err(FtpError::DeadlineExceeded { opcode, deadline });
                    }
                    policy.timeout.min(deadline - elapsed)
                }
                None => policy.timeout,
            };

            attempts += 1;
            debug!(
                "Sending {} seq {} (attempt {}/{})",
                describe(opcode),
                request.seq,
                attempts,
                policy.max_attempts
            );

            if let Err(e) = self.transport.send(packet.clone()).await {
                if !e.is_transient() {
                    return Err(e);
                }
                warn!("Transmit of {} failed: {}", describe(opcode), e);
                continue;
            }

            match timeout(wait, &mut in_flight.receiver).await {
                Ok(Ok(response)) => {
                    debug!(
                        "Received {} seq {} for {}",
                        describe(response.opcode),
                        response.seq,
                        describe(opcode)
                    );
                    return Ok(response);
                }
                Ok(Err(_)) => return Err(FtpError::TransportClosed),
                Err(_) => warn!(
                    "Timed out after {:?} waiting for {} seq {}",
                    wait,
                    describe(opcode),
                    request.seq
                ),
            }
        }

        Err(FtpError::ExchangeFailed { opcode, attempts })
    }
}
