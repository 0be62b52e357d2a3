#![allow(dead_code)]

use async_trait::async_trait;
use mavftp::core::{FtpError, FtpResult, TargetAddress, TelemetryPacket, Transport};
use mavftp::file_transfer::{FileTransferMessage, FtpPayload};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type Responder = Box<dyn FnMut(&FtpPayload) -> Vec<TelemetryPacket> + Send>;

/// Transport that answers each request through a closure and records what was sent
pub struct ScriptedTransport {
    replies: mpsc::UnboundedSender<TelemetryPacket>,
    responder: Mutex<Responder>,
    sent: Mutex<Vec<FtpPayload>>,
    failures_left: Mutex<u32>,
}

impl ScriptedTransport {
    pub fn new<F>(responder: F) -> (Arc<Self>, mpsc::UnboundedReceiver<TelemetryPacket>)
    where
        F: FnMut(&FtpPayload) -> Vec<TelemetryPacket> + Send + 'static,
    {
        let (replies, inbound) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            replies,
            responder: Mutex::new(Box::new(responder)),
            sent: Mutex::new(Vec::new()),
            failures_left: Mutex::new(0),
        });
        (transport, inbound)
    }

    /// Make the next `count` sends fail with a transient error
    pub fn fail_next(&self, count: u32) {
        *self.failures_left.lock().unwrap() = count;
    }

    pub fn sent(&self) -> Vec<FtpPayload> {
        self.sent.lock().unwrap().clone()
    }

    /// Push a packet into the inbound stream outside of any request
    pub fn inject(&self, packet: TelemetryPacket) {
        self.replies.send(packet).unwrap();
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, packet: TelemetryPacket) -> FtpResult<()> {
        {
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(FtpError::Transport("link busy".into()));
            }
        }

        let request = FileTransferMessage::decode(&packet.payload)?.payload;
        self.sent.lock().unwrap().push(request.clone());

        let replies = {
            let mut responder = self.responder.lock().unwrap();
            (**responder)(&request)
        };
        for reply in replies {
            let _ = self.replies.send(reply);
        }
        Ok(())
    }
}

/// Wrap a reply payload the way the remote puts it on the wire
pub fn packet(payload: FtpPayload) -> TelemetryPacket {
    FileTransferMessage::new(TargetAddress::default(), payload)
        .into_packet()
        .unwrap()
}

/// A packet of some other sub-protocol sharing the stream
pub fn heartbeat() -> TelemetryPacket {
    TelemetryPacket::new(0, vec![0, 0, 0, 0, 6, 8, 0, 0, 3])
}
