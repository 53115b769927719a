use super::{FinishedProcessor, NegotiatedParams};
use crate::crypto::keys::KeyScheduler;
use crate::crypto::verify_data::VerifyDataScheme;
use crate::error::{HandshakeError, Result};
use crate::protocol::flight::PendingMessages;
use crate::protocol::state::Ready;
use crate::protocol::transcript::TranscriptHasher;
use std::marker::PhantomData;
use tracing::debug;

/// Marker type for a missing field in the builder.
///
/// 用于在构建器中标记缺失字段的类型。
#[derive(Debug)]
pub struct Missing;

/// A builder for creating a `FinishedProcessor` in the `Ready` state.
///
/// `build` only exists once the parameters, the transcript and the key
/// scheduler have all been supplied.
///
/// 用于创建处于 `Ready` 状态的 `FinishedProcessor` 的构建器。
///
/// 只有在提供了参数、握手记录和密钥调度器之后，`build` 才可用。
#[derive(Debug)]
pub struct FinishedProcessorBuilder<P, T, K> {
    params: P,
    transcript: T,
    scheduler: K,
    pending: PendingMessages,
}

impl FinishedProcessorBuilder<Missing, Missing, Missing> {
    pub fn new() -> Self {
        Self {
            params: Missing,
            transcript: Missing,
            scheduler: Missing,
            pending: PendingMessages::new(),
        }
    }
}

impl Default for FinishedProcessorBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, T, K> FinishedProcessorBuilder<P, T, K> {
    /// Sets the negotiated parameters.
    ///
    /// 设置已协商的参数。
    pub fn params(self, params: NegotiatedParams) -> FinishedProcessorBuilder<NegotiatedParams, T, K> {
        FinishedProcessorBuilder {
            params,
            transcript: self.transcript,
            scheduler: self.scheduler,
            pending: self.pending,
        }
    }

    /// Sets the transcript holding every handshake message before the
    /// Finished messages.
    ///
    /// 设置包含 Finished 之前所有握手消息的握手记录。
    pub fn transcript<T2: TranscriptHasher>(self, transcript: T2) -> FinishedProcessorBuilder<P, T2, K> {
        FinishedProcessorBuilder {
            params: self.params,
            transcript,
            scheduler: self.scheduler,
            pending: self.pending,
        }
    }

    /// Sets the key scheduler.
    ///
    /// 设置密钥调度器。
    pub fn key_scheduler<K2: KeyScheduler>(self, scheduler: K2) -> FinishedProcessorBuilder<P, T, K2> {
        FinishedProcessorBuilder {
            params: self.params,
            transcript: self.transcript,
            scheduler,
            pending: self.pending,
        }
    }

    /// Prerequisites still outstanding when the processor starts.
    pub fn pending(mut self, pending: PendingMessages) -> Self {
        self.pending = pending;
        self
    }
}

impl<T: TranscriptHasher, K: KeyScheduler> FinishedProcessorBuilder<NegotiatedParams, T, K> {
    /// Builds the `FinishedProcessor`.
    ///
    /// Fails before any cryptographic work when the version, the suite and
    /// the transcript hash do not belong together.
    ///
    /// 构建 `FinishedProcessor`。
    ///
    /// 当版本、密码套件与握手记录哈希不匹配时，在任何密码运算之前返回错误。
    pub fn build(self) -> Result<FinishedProcessor<Ready, T, K>> {
        let params = self.params;
        let scheme = VerifyDataScheme::for_version(params.version)?;
        params.validate()?;

        let expected_digest_len = if params.version.uses_legacy_transcript() {
            16 + 20
        } else {
            params.cipher_suite.info().hash_length
        };
        let digest_len = self.transcript.digest().len();
        if digest_len != expected_digest_len {
            return Err(HandshakeError::configuration(format!(
                "transcript digest is {digest_len} bytes, {} with {:?} needs {expected_digest_len}",
                params.version, params.cipher_suite
            )));
        }

        debug!(
            role = %params.role,
            version = %params.version,
            suite = ?params.cipher_suite,
            phase = ?params.phase,
            "Finished processor ready"
        );

        Ok(FinishedProcessor {
            state: PhantomData,
            params,
            scheme,
            transcript: self.transcript,
            scheduler: self.scheduler,
            pending: self.pending,
            peer_cipher_spec_changed: false,
            client_verify_data: None,
            server_verify_data: None,
            application_context: None,
            exporter_master_secret: None,
            resumption_master_secret: None,
        })
    }
}
