use crate::core::{
    domain::{RetryPolicy, SessionState, TelemetryPacket, TransferProgress},
    error::{FtpError, FtpResult},
    traits::Transport,
};
use crate::file_transfer::{DirectoryEntry, FtpPayload, decode_listing};
use crate::infrastructure::{config::FtpConfig, correlator::Correlator};
use crate::protocol::{ErrorCode, MAX_WIRE_DATA_LEN, Opcode};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// File transfer client for one remote component.
///
/// Owns the session id and sequence number. Every operation borrows the
/// client mutably, so at most one request is ever outstanding.
pub struct FtpClient {
    correlator: Correlator,
    state: SessionState,
    policy: RetryPolicy,
    read_chunk: u8,
}

impl FtpClient {
    pub fn new(correlator: Correlator, config: &FtpConfig) -> Self {
        Self {
            correlator,
            state: SessionState::default(),
            policy: config.retry_policy(),
            read_chunk: config.read_chunk_size,
        }
    }

    /// Attach to a link and build a client in one step.
    ///
    /// The returned receiver yields every inbound packet, unchanged, for
    /// other consumers of the stream.
    pub fn connect(
        transport: Arc<dyn Transport>,
        inbound: mpsc::UnboundedReceiver<TelemetryPacket>,
        config: &FtpConfig,
    ) -> FtpResult<(Self, mpsc::UnboundedReceiver<TelemetryPacket>)> {
        config.validate()?;
        let (correlator, downstream) = Correlator::attach(transport, inbound, config.target);
        Ok((Self::new(correlator, config), downstream))
    }

    pub fn session_id(&self) -> u8 {
        self.state.session_id
    }

    pub fn sequence(&self) -> u16 {
        self.state.sequence
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Stamp, send and wait; the response's sequence number becomes ours
    async fn transact(&mut self, mut request: FtpPayload) -> FtpResult<FtpPayload> {
        request.seq = self.state.next_sequence();
        let response = self.correlator.exchange(&request, &self.policy).await?;
        self.state.adopt(&response);
        Ok(response)
    }

    fn path_request(&self, opcode: Opcode, offset: u32, path: &str) -> FtpResult<FtpPayload> {
        if path.len() > MAX_WIRE_DATA_LEN {
            return Err(FtpError::PayloadTooLarge {
                len: path.len(),
                max: MAX_WIRE_DATA_LEN,
            });
        }
        FtpPayload::request(opcode, self.state.session_id, offset, path.as_bytes().to_vec())
    }

    /// Drop every session on the remote
    pub async fn reset_sessions(&mut self) -> FtpResult<()> {
        let request = FtpPayload::request(Opcode::ResetSessions, self.state.session_id, 0, Vec::new())?;
        let response = self.transact(request).await?;
        expect_ack(response)?;

        self.state.mark_reset();
        info!("Remote sessions reset");
        Ok(())
    }

    /// List a remote directory, paging until the remote signals EOF
    pub async fn list_directory(&mut self, path: &str) -> FtpResult<Vec<DirectoryEntry>> {
        let mut entries: Vec<DirectoryEntry> = Vec::new();

        loop {
            let request = self.path_request(Opcode::ListDirectory, entries.len() as u32, path)?;
            let response = self.transact(request).await?;

            if response.is_eof() {
                break;
            }
            let page = decode_listing(&expect_ack(response)?.data)?;
            if page.is_empty() {
                // Nothing new would come back for the same offset.
                break;
            }
            debug!("Listing {}: {} entries at offset {}", path, page.len(), entries.len());
            entries.extend(page);
        }

        info!("Listed {} entries in {}", entries.len(), path);
        Ok(entries)
    }

    /// Open a file for reading; returns the size the remote reported (0 if none)
    async fn open_file_ro(&mut self, path: &str) -> FtpResult<u32> {
        let request = self.path_request(Opcode::OpenFileRo, 0, path)?;
        let response = expect_ack(self.transact(request).await?)?;

        self.state.open(response.session);
        let size = response
            .data
            .get(..4)
            .map(|bytes| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .unwrap_or(0);

        info!("Opened {} in session {} ({} bytes)", path, response.session, size);
        Ok(size)
    }

    /// Read the open file from offset 0 until the remote signals EOF
    async fn read_file<F>(&mut self, size: u32, on_progress: &mut F) -> FtpResult<Vec<u8>>
    where
        F: FnMut(TransferProgress) + Send,
    {
        let mut contents = Vec::with_capacity(size as usize);
        let mut progress = TransferProgress::new(size as u64);

        loop {
            let request =
                FtpPayload::read_request(self.state.session_id, contents.len() as u32, self.read_chunk);
            let response = self.transact(request).await?;

            if response.is_eof() {
                break;
            }
            let chunk = expect_ack(response)?.data;
            if chunk.is_empty() {
                break;
            }
            contents.extend_from_slice(&chunk);
            progress.update(contents.len() as u64);
            on_progress(progress);
        }

        progress.complete(contents.len() as u64);
        on_progress(progress);
        Ok(contents)
    }

    /// Release the open session; the local handle is cleared either way
    async fn terminate_session(&mut self) -> FtpResult<()> {
        let session = self.state.session_id;
        let request = FtpPayload::request(Opcode::TerminateSession, session, 0, Vec::new())?;
        let outcome = self.transact(request).await.and_then(expect_ack);
        self.state.terminate();

        outcome.map(|_| debug!("Session {} terminated", session))
    }

    /// Download a whole file
    pub async fn download_file(&mut self, path: &str) -> FtpResult<Vec<u8>> {
        self.download_file_with_progress(path, |_| {}).await
    }

    /// Download a whole file, reporting progress after every chunk.
    ///
    /// Once the open succeeds the session is always terminated. When both the
    /// read and the terminate fail, the read error is returned.
    pub async fn download_file_with_progress<F>(
        &mut self,
        path: &str,
        mut on_progress: F,
    ) -> FtpResult<Vec<u8>>
    where
        F: FnMut(TransferProgress) + Send,
    {
        let size = self.open_file_ro(path).await?;
        let read = self.read_file(size, &mut on_progress).await;
        let terminated = self.terminate_session().await;

        match (read, terminated) {
            (Ok(contents), Ok(())) => {
                info!("Downloaded {} ({} bytes)", path, contents.len());
                Ok(contents)
            }
            (Ok(contents), Err(e)) => {
                warn!("Downloaded {} but could not release its session: {}", path, e);
                Ok(contents)
            }
            (Err(e), Ok(())) => Err(e),
            (Err(read_err), Err(terminate_err)) => {
                warn!("Terminate after failed read of {} also failed: {}", path, terminate_err);
                Err(read_err)
            }
        }
    }

    /// Delete a remote file
    pub async fn remove_file(&mut self, path: &str) -> FtpResult<()> {
        let request = self.path_request(Opcode::RemoveFile, 0, path)?;
        expect_ack(self.transact(request).await?)?;
        info!("Removed {}", path);
        Ok(())
    }

    /// Delete an empty remote directory
    pub async fn remove_directory(&mut self, path: &str) -> FtpResult<()> {
        let request = self.path_request(Opcode::RemoveDirectory, 0, path)?;
        expect_ack(self.transact(request).await?)?;
        info!("Removed directory {}", path);
        Ok(())
    }

    /// CRC32 of a remote file, computed by the remote
    pub async fn file_crc32(&mut self, path: &str) -> FtpResult<u32> {
        let request = self.path_request(Opcode::CalcFileCrc32, 0, path)?;
        let response = expect_ack(self.transact(request).await?)?;

        match response.data.get(..4) {
            Some(bytes) => Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            None => Err(FtpError::MalformedPayload {
                needed: 4,
                actual: response.data.len(),
            }),
        }
    }
}

/// Pass an ACK through, turn a NAK into its error
fn expect_ack(response: FtpPayload) -> FtpResult<FtpPayload> {
    match response.kind() {
        Some(Opcode::Ack) => Ok(response),
        Some(Opcode::Nak) => Err(nak_error(&response)),
        _ => Err(FtpError::UnexpectedResponse(response.opcode)),
    }
}

/// Map a NAK's reason; FailErrno carries the remote errno in the second byte
fn nak_error(response: &FtpPayload) -> FtpError {
    match response.error_code() {
        ErrorCode::FailErrno => FtpError::Filesystem {
            errno: response.data.get(1).copied(),
        },
        code => FtpError::Remote(code),
    }
}
