use crate::core::error::{FtpError, FtpResult};
use crate::file_transfer::types::FtpPayload;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What happened to an inbound file transfer payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Handed to the waiting request
    Delivered,
    /// Not an ACK or NAK (e.g. another client's request seen on the link)
    NotAResponse,
    /// No request is waiting
    Unsolicited,
    /// Repeats the last accepted response
    Duplicate { seq: u16 },
    /// Answers a different request than the one in flight
    Mismatched { expected: u8, actual: u8 },
    /// Right opcode, wrong offset: a late answer to an earlier request
    StaleOffset { expected: u32, actual: u32 },
    /// The waiter gave up before the response arrived
    Abandoned,
}

struct Waiter {
    token: u64,
    req_opcode: u8,
    offset: u32,
    reply: oneshot::Sender<FtpPayload>,
}

/// What a response echoes back from its request, plus its own sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReplyKey {
    seq: u16,
    req_opcode: u8,
    offset: u32,
}

impl ReplyKey {
    fn of(payload: &FtpPayload) -> Self {
        Self {
            seq: payload.seq,
            req_opcode: payload.req_opcode,
            offset: payload.offset,
        }
    }
}

#[derive(Default)]
struct RouterState {
    waiter: Option<Waiter>,
    last_accepted: Option<ReplyKey>,
    next_token: u64,
    closed: bool,
}

/// Single-slot table mapping the in-flight request to a one-shot waiter
#[derive(Default)]
pub struct ResponseRouter {
    state: Mutex<RouterState>,
}

/// Registration of the one in-flight request; dropping it frees the slot
pub struct InFlight<'a> {
    router: &'a ResponseRouter,
    token: u64,
    pub receiver: oneshot::Receiver<FtpPayload>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.router.release(self.token);
    }
}

impl ResponseRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RouterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the slot for `request`; only a response echoing its opcode and
    /// offset will be delivered
    pub fn register(&self, request: &FtpPayload) -> FtpResult<InFlight<'_>> {
        let mut state = self.lock();
        if state.closed {
            return Err(FtpError::TransportClosed);
        }
        if state.waiter.is_some() {
            return Err(FtpError::RequestInFlight);
        }

        let token = state.next_token;
        state.next_token = state.next_token.wrapping_add(1);
        let (reply, receiver) = oneshot::channel();
        state.waiter = Some(Waiter {
            token,
            req_opcode: request.opcode,
            offset: request.offset,
            reply,
        });

        Ok(InFlight {
            router: self,
            token,
            receiver,
        })
    }

    fn release(&self, token: u64) {
        let mut state = self.lock();
        if state.waiter.as_ref().is_some_and(|w| w.token == token) {
            state.waiter = None;
        }
    }

    /// Route one decoded payload to the waiting request, if it answers it
    pub fn dispatch(&self, payload: FtpPayload) -> Dispatch {
        let mut state = self.lock();

        if !payload.is_response() {
            return Dispatch::NotAResponse;
        }
        let key = ReplyKey::of(&payload);
        if state.last_accepted == Some(key) {
            return Dispatch::Duplicate { seq: payload.seq };
        }

        let Some(waiter) = state.waiter.take() else {
            return Dispatch::Unsolicited;
        };
        if waiter.req_opcode != payload.req_opcode {
            let expected = waiter.req_opcode;
            state.waiter = Some(waiter);
            return Dispatch::Mismatched {
                expected,
                actual: payload.req_opcode,
            };
        }
        if waiter.offset != payload.offset {
            let expected = waiter.offset;
            state.waiter = Some(waiter);
            return Dispatch::StaleOffset {
                expected,
                actual: payload.offset,
            };
        }

        match waiter.reply.send(payload) {
            Ok(()) => {
                state.last_accepted = Some(key);
                Dispatch::Delivered
            }
            Err(_) => Dispatch::Abandoned,
        }
    }

    /// The inbound stream ended: fail the waiter and refuse new requests
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.waiter = None;
    }
}

/// Log a dispatch outcome at the level it deserves
pub fn log_dispatch(outcome: Dispatch, payload_seq: u16) {
    match outcome {
        Dispatch::Delivered => debug!("Response seq {} delivered", payload_seq),
        Dispatch::NotAResponse => debug!("Ignoring non-response payload seq {}", payload_seq),
        Dispatch::Duplicate { seq } => warn!("Dropping duplicate response seq {}", seq),
        Dispatch::Unsolicited => warn!("Dropping unsolicited response seq {}", payload_seq),
        Dispatch::Mismatched { expected, actual } => warn!(
            "Dropping stale response seq {}: answers opcode {}, waiting on {}",
            payload_seq, actual, expected
        ),
        Dispatch::StaleOffset { expected, actual } => warn!(
            "Dropping stale response seq {}: offset {}, waiting on offset {}",
            payload_seq, actual, expected
        ),
        Dispatch::Abandoned => debug!("Response seq {} arrived after its waiter left", payload_seq),
    }
}
