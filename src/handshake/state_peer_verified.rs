use super::FinishedProcessor;
use crate::crypto::keys::KeyScheduler;
use crate::error::Result;
use crate::protocol::state::{Established, PeerFinishVerified};
use crate::protocol::transcript::TranscriptHasher;
use tracing::warn;

impl<T: TranscriptHasher, K: KeyScheduler> FinishedProcessor<PeerFinishVerified, T, K> {
    /// Answers the peer's verified Finished with the local one.
    ///
    /// The local verify data covers the peer's Finished, which is already in
    /// the transcript.
    ///
    /// 以本端的 Finished 应答已验证的对端 Finished。
    /// 本端的 verify data 覆盖已经进入握手记录的对端 Finished。
    pub fn produce_finished(mut self) -> Result<(Vec<u8>, FinishedProcessor<Established, T, K>)> {
        let encoded = self
            .produce()
            .inspect_err(|e| warn!(role = %self.params.role, "aborting on produce: {e}"))?;
        Ok((encoded, self.into_state()))
    }
}
