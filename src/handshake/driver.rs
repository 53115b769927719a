use super::{EstablishedSession, FinishedProcessor};
use crate::crypto::keys::KeyScheduler;
use crate::error::{HandshakeError, Result};
use crate::protocol::flight::PendingMessages;
use crate::protocol::state::{Established, LocalFinishSent, PeerFinishVerified, Ready, SessionState};
use crate::protocol::transcript::TranscriptHasher;
use std::mem;
use tracing::warn;

/// Runtime driver over the typestate processor.
///
/// For callers that dispatch on incoming messages at runtime and cannot
/// thread the processor's type through their own state. Any failure leaves
/// the driver `Aborted`, and every later call fails with `UnexpectedMessage`.
///
/// 类型状态处理器的运行时驱动器。
///
/// 适用于在运行时按到达消息分派、无法在自身状态中传递处理器类型的调用方。
/// 任何失败都会使驱动器进入 `Aborted`，之后的每次调用都返回 `UnexpectedMessage`。
#[derive(Debug)]
pub enum FinishDriver<T: TranscriptHasher, K: KeyScheduler> {
    Ready(FinishedProcessor<Ready, T, K>),
    LocalFinishSent(FinishedProcessor<LocalFinishSent, T, K>),
    PeerFinishVerified(FinishedProcessor<PeerFinishVerified, T, K>),
    Established(FinishedProcessor<Established, T, K>),
    Aborted,
}

impl<T: TranscriptHasher, K: KeyScheduler> FinishDriver<T, K> {
    pub fn new(processor: FinishedProcessor<Ready, T, K>) -> Self {
        FinishDriver::Ready(processor)
    }

    pub fn state(&self) -> SessionState {
        match self {
            FinishDriver::Ready(processor) if processor.sends_first() => {
                SessionState::AwaitingLocalFinish
            }
            FinishDriver::Ready(_) => SessionState::AwaitingPeerFinish,
            FinishDriver::LocalFinishSent(_) => SessionState::LocalFinishSent,
            FinishDriver::PeerFinishVerified(_) => SessionState::Verified,
            FinishDriver::Established(_) => SessionState::Established,
            FinishDriver::Aborted => SessionState::Aborted,
        }
    }

    /// Produces the local Finished if the exchange is waiting for it.
    ///
    /// 若交换正在等待本端 Finished，则生成它。
    pub fn produce_finished(&mut self) -> Result<Vec<u8>> {
        let (encoded, next) = match mem::replace(self, FinishDriver::Aborted) {
            FinishDriver::Ready(processor) => {
                let (encoded, next) = processor.produce_finished()?;
                (encoded, FinishDriver::LocalFinishSent(next))
            }
            FinishDriver::PeerFinishVerified(processor) => {
                let (encoded, next) = processor.produce_finished()?;
                (encoded, FinishDriver::Established(next))
            }
            other => return Err(Self::abort("produce a Finished", other.state())),
        };
        *self = next;
        Ok(encoded)
    }

    /// Consumes the peer's Finished if the exchange is waiting for it.
    ///
    /// 若交换正在等待对端 Finished，则消费它。
    pub fn consume_finished(&mut self, message: &[u8]) -> Result<()> {
        *self = match mem::replace(self, FinishDriver::Aborted) {
            FinishDriver::Ready(processor) => {
                FinishDriver::PeerFinishVerified(processor.consume_finished(message)?)
            }
            FinishDriver::LocalFinishSent(processor) => {
                FinishDriver::Established(processor.consume_finished(message)?)
            }
            other => return Err(Self::abort("consume a Finished", other.state())),
        };
        Ok(())
    }

    /// Forwards the peer's ChangeCipherSpec to the processor.
    pub fn accept_change_cipher_spec(&mut self) -> Result<()> {
        let state = self.state();
        let outcome = match self {
            FinishDriver::Ready(processor) => processor.accept_change_cipher_spec(),
            FinishDriver::LocalFinishSent(processor) => processor.accept_change_cipher_spec(),
            _ => Err(Self::abort("accept ChangeCipherSpec", state)),
        };
        if outcome.is_err() {
            *self = FinishDriver::Aborted;
        }
        outcome
    }

    /// Outstanding prerequisites, unless the exchange is over.
    pub fn pending_mut(&mut self) -> Option<&mut PendingMessages> {
        match self {
            FinishDriver::Ready(processor) => Some(processor.pending_mut()),
            FinishDriver::LocalFinishSent(processor) => Some(processor.pending_mut()),
            FinishDriver::PeerFinishVerified(processor) => Some(processor.pending_mut()),
            FinishDriver::Established(_) | FinishDriver::Aborted => None,
        }
    }

    pub fn session(&self) -> Option<EstablishedSession> {
        match self {
            FinishDriver::Established(processor) => Some(processor.session()),
            _ => None,
        }
    }

    pub fn into_established(self) -> Option<FinishedProcessor<Established, T, K>> {
        match self {
            FinishDriver::Established(processor) => Some(processor),
            _ => None,
        }
    }

    fn abort(operation: &str, state: SessionState) -> HandshakeError {
        warn!(?state, "cannot {operation}, aborting");
        HandshakeError::unexpected(format!("cannot {operation} in state {state:?}"))
    }
}
