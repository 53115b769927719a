use super::FinishedProcessor;
use crate::crypto::keys::KeyScheduler;
use crate::error::Result;
use crate::protocol::state::{Established, LocalFinishSent};
use crate::protocol::transcript::TranscriptHasher;
use tracing::warn;

impl<T: TranscriptHasher, K: KeyScheduler> FinishedProcessor<LocalFinishSent, T, K> {
    /// Verifies the peer's answering Finished, completing the exchange.
    ///
    /// 验证对端应答的 Finished 消息，完成交换。
    pub fn consume_finished(
        mut self,
        message: &[u8],
    ) -> Result<FinishedProcessor<Established, T, K>> {
        self.consume(message)
            .inspect_err(|e| warn!(role = %self.params.role, "aborting on consume: {e}"))?;
        Ok(self.into_state())
    }
}
