use super::FinishedProcessor;
use crate::crypto::keys::KeyScheduler;
use crate::error::{HandshakeError, Result};
use crate::protocol::state::{LocalFinishSent, PeerFinishVerified, Ready};
use crate::protocol::transcript::TranscriptHasher;
use crate::protocol::version::first_finished_sender;
use tracing::warn;

impl<T: TranscriptHasher, K: KeyScheduler> FinishedProcessor<Ready, T, K> {
    /// Sends the first Finished of the exchange.
    ///
    /// Only valid for the side that speaks first: the client on a full
    /// pre-1.3 handshake, the server on an abbreviated one and always the
    /// server in TLS 1.3. Before TLS 1.3 the write keys switch as the local
    /// ChangeCipherSpec goes out.
    ///
    /// 发送本次交换的第一条 Finished 消息。
    ///
    /// 仅对先发言的一方有效：TLS 1.3 之前的完整握手为客户端，简化握手为服务器，
    /// TLS 1.3 中始终为服务器。TLS 1.3 之前，写入密钥会随本端 ChangeCipherSpec 一同切换。
    pub fn produce_finished(
        mut self,
    ) -> Result<(Vec<u8>, FinishedProcessor<LocalFinishSent, T, K>)> {
        self.ensure_turn(true)?;
        let encoded = self
            .produce()
            .inspect_err(|e| warn!(role = %self.params.role, "aborting on produce: {e}"))?;
        Ok((encoded, self.into_state()))
    }

    /// Verifies the first Finished of the exchange, sent by the peer.
    ///
    /// 验证由对端发送的本次交换的第一条 Finished 消息。
    pub fn consume_finished(
        mut self,
        message: &[u8],
    ) -> Result<FinishedProcessor<PeerFinishVerified, T, K>> {
        self.ensure_turn(false)?;
        self.consume(message)
            .inspect_err(|e| warn!(role = %self.params.role, "aborting on consume: {e}"))?;
        Ok(self.into_state())
    }

    fn ensure_turn(&self, producing: bool) -> Result<()> {
        if self.sends_first() == producing {
            return Ok(());
        }
        let first = first_finished_sender(self.params.version, self.params.phase);
        warn!(role = %self.params.role, "Finished out of order");
        Err(HandshakeError::unexpected(format!(
            "the {first} sends the first Finished in a {:?} {} handshake",
            self.params.phase, self.params.version
        )))
    }
}
