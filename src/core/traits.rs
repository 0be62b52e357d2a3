use super::domain::TelemetryPacket;
use super::error::FtpResult;
use async_trait::async_trait;

/// Outbound half of the shared telemetry link.
///
/// Inbound traffic arrives separately as a channel of packets so the
/// correlator can observe it and pass it on untouched.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, packet: TelemetryPacket) -> FtpResult<()>;
}
