//! The Finished exchange as a typestate machine.
//!
//! 以类型状态机实现的 Finished 交换。

use crate::crypto::keys::{KeyScheduler, Secret, SecretLabel};
use crate::crypto::verify_data::{VerifyDataInput, VerifyDataScheme, finished_sender};
use crate::error::{HandshakeError, Result};
use crate::protocol::flight::{PendingMessages, Prerequisite};
use crate::protocol::message::{
    FinishedMessage, HandshakeMessage, VerifyData, expected_verify_data_len,
};
use crate::protocol::state::AwaitingPeerFinish;
use crate::protocol::transcript::TranscriptHasher;
use crate::protocol::version::{Direction, HandshakeRole, first_finished_sender};
use std::marker::PhantomData;
use tracing::{debug, trace, warn};

mod builder;
mod driver;
mod params;
mod state_established;
mod state_local_sent;
mod state_peer_verified;
mod state_ready;

pub use builder::{FinishedProcessorBuilder, Missing};
pub use driver::FinishDriver;
pub use params::NegotiatedParams;
pub use state_established::EstablishedSession;

/// Processor for the two Finished messages that close a handshake.
///
/// Generic over the state `S`, so that producing or consuming a Finished
/// message is only possible where the protocol allows it. Every operation
/// takes the processor by value; on error it is dropped and the handshake
/// is over.
///
/// 结束握手的两条 Finished 消息的处理器。
///
/// 通过泛型状态 `S`，只有在协议允许时才能生成或消费 Finished 消息。
/// 每个操作都按值获取处理器；出错时处理器被丢弃，握手随之终止。
#[derive(Debug)]
pub struct FinishedProcessor<S, T: TranscriptHasher, K: KeyScheduler> {
    /// Zero-sized marker to hold the current state `S`.
    ///
    /// 零大小标记，用于持有当前状态 `S`。
    state: PhantomData<S>,
    params: NegotiatedParams,
    scheme: VerifyDataScheme,
    /// Running hash of every handshake message so far, Finished messages
    /// included once they are exchanged.
    ///
    /// 迄今为止所有握手消息的滚动哈希，Finished 消息在交换后也会加入。
    transcript: T,
    scheduler: K,
    pending: PendingMessages,
    peer_cipher_spec_changed: bool,
    client_verify_data: Option<VerifyData>,
    server_verify_data: Option<VerifyData>,
    /// TLS 1.3 transcript hash through the server Finished.
    application_context: Option<Vec<u8>>,
    exporter_master_secret: Option<Secret>,
    resumption_master_secret: Option<Secret>,
}

impl<S, T: TranscriptHasher, K: KeyScheduler> FinishedProcessor<S, T, K> {
    pub fn params(&self) -> &NegotiatedParams {
        &self.params
    }

    pub fn transcript(&self) -> &T {
        &self.transcript
    }

    pub fn key_scheduler(&self) -> &K {
        &self.scheduler
    }

    /// Prerequisites the surrounding handshake still has to satisfy.
    ///
    /// 外层握手仍需满足的前置消息。
    pub fn pending_mut(&mut self) -> &mut PendingMessages {
        &mut self.pending
    }

    pub fn pending(&self) -> &PendingMessages {
        &self.pending
    }

    /// True when the local role sends the first Finished of the exchange.
    pub fn sends_first(&self) -> bool {
        first_finished_sender(self.params.version, self.params.phase) == self.params.role
    }

    fn into_state<N>(self) -> FinishedProcessor<N, T, K> {
        FinishedProcessor {
            state: PhantomData,
            params: self.params,
            scheme: self.scheme,
            transcript: self.transcript,
            scheduler: self.scheduler,
            pending: self.pending,
            peer_cipher_spec_changed: self.peer_cipher_spec_changed,
            client_verify_data: self.client_verify_data,
            server_verify_data: self.server_verify_data,
            application_context: self.application_context,
            exporter_master_secret: self.exporter_master_secret,
            resumption_master_secret: self.resumption_master_secret,
        }
    }

    fn compute_verify_data(&self, is_validating: bool) -> Result<VerifyData> {
        let role = self.params.role;
        let base_secret = self
            .scheduler
            .finished_base_secret(finished_sender(role, is_validating))?;
        let input = VerifyDataInput {
            transcript: &self.transcript,
            base_secret,
            suite: self.params.cipher_suite.info(),
        };
        self.scheme.create_verify_data(&input, role, is_validating)
    }

    /// Builds the local Finished and moves the transcript and keys past it.
    fn produce(&mut self) -> Result<Vec<u8>> {
        let NegotiatedParams {
            version,
            role,
            phase,
            ..
        } = self.params;
        self.pending.check_outbound(phase)?;

        let verify_data = self.compute_verify_data(false)?;

        if !version.is_tls13() {
            // The local ChangeCipherSpec goes out right before the Finished.
            let master = self.scheduler.finished_base_secret(role)?.clone();
            self.scheduler
                .transition_traffic_keys(Direction::Write, &master)?;
            self.pending.mark_sent(Prerequisite::ChangeCipherSpec);
        }

        let message = FinishedMessage::new(verify_data);
        let encoded = message.encode();
        debug!(%role, %version, len = encoded.len(), "produced Finished");
        trace!("outbound handshake message\n{message}");

        self.record_finished(role, message)?;
        Ok(encoded)
    }

    /// Decodes and verifies the peer's Finished, then moves past it.
    ///
    /// Before TLS 1.3 the peer's ChangeCipherSpec must already be accepted.
    fn consume(&mut self, bytes: &[u8]) -> Result<()> {
        let NegotiatedParams {
            version,
            cipher_suite,
            role,
            phase,
            ..
        } = self.params;
        let sender = role.peer();
        if !version.is_tls13() && !self.peer_cipher_spec_changed {
            return Err(HandshakeError::unexpected("Missing ChangeCipherSpec message"));
        }
        self.pending.check_inbound(version, phase)?;

        let message = FinishedMessage::decode(bytes, expected_verify_data_len(version, cipher_suite))?;
        trace!("inbound handshake message\n{message}");

        // Must run before the peer's Finished enters the transcript.
        let expected = self.compute_verify_data(true)?;
        if message.verify_data != expected {
            warn!(%role, %version, "{sender} Finished failed verification");
            return Err(HandshakeError::VerifyDataMismatch { sender });
        }
        debug!(%role, %version, "verified {sender} Finished");

        self.record_finished(sender, message)
    }

    fn record_finished(&mut self, sender: HandshakeRole, message: FinishedMessage) -> Result<()> {
        let verify_data = message.verify_data.clone();
        self.transcript
            .update_message(&HandshakeMessage::Finished(message))?;

        if self.params.secure_renegotiation {
            match sender {
                HandshakeRole::Initiator => self.client_verify_data = Some(verify_data),
                HandshakeRole::Responder => self.server_verify_data = Some(verify_data),
            }
        }

        if self.params.version.is_tls13() {
            self.switch_to_application_keys(sender)?;
        }
        Ok(())
    }

    /// TLS 1.3: once `sender`'s Finished is hashed, its traffic moves to the
    /// application secret.
    fn switch_to_application_keys(&mut self, sender: HandshakeRole) -> Result<()> {
        let direction = if sender == self.params.role {
            Direction::Write
        } else {
            Direction::Read
        };

        let context = match sender {
            HandshakeRole::Responder => {
                let context = self.transcript.digest();
                self.exporter_master_secret = Some(
                    self.scheduler
                        .derive_secret(SecretLabel::ExporterMaster, &context)?,
                );
                self.application_context = Some(context.clone());
                context
            }
            HandshakeRole::Initiator => self.application_context.clone().ok_or_else(|| {
                HandshakeError::unexpected("client Finished before server Finished")
            })?,
        };

        let traffic_secret = self
            .scheduler
            .derive_secret(SecretLabel::application_traffic(sender), &context)?;
        self.scheduler
            .transition_traffic_keys(direction, &traffic_secret)?;
        trace!(%sender, ?direction, "switched to application traffic keys");

        if sender == HandshakeRole::Initiator {
            let full_transcript = self.transcript.digest();
            self.resumption_master_secret = Some(
                self.scheduler
                    .derive_secret(SecretLabel::ResumptionMaster, &full_transcript)?,
            );
        }
        Ok(())
    }
}

impl<S: AwaitingPeerFinish, T: TranscriptHasher, K: KeyScheduler> FinishedProcessor<S, T, K> {
    /// Handles the peer's ChangeCipherSpec, which switches the read keys.
    ///
    /// In TLS 1.3 the message only exists for middlebox compatibility and
    /// is ignored.
    ///
    /// 处理对端的 ChangeCipherSpec，切换读取密钥。
    /// 在 TLS 1.3 中该消息仅用于中间设备兼容，会被忽略。
    pub fn accept_change_cipher_spec(&mut self) -> Result<()> {
        let NegotiatedParams { version, role, .. } = self.params;
        if version.is_tls13() {
            trace!("ignoring compatibility ChangeCipherSpec");
            return Ok(());
        }
        if self.peer_cipher_spec_changed {
            return Err(HandshakeError::unexpected("duplicate ChangeCipherSpec message"));
        }

        let master = self.scheduler.finished_base_secret(role.peer())?.clone();
        self.scheduler
            .transition_traffic_keys(Direction::Read, &master)?;
        self.pending.mark_received(Prerequisite::ChangeCipherSpec);
        self.peer_cipher_spec_changed = true;
        debug!(%role, %version, "peer ChangeCipherSpec accepted");
        Ok(())
    }
}
