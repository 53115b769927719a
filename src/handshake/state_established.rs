use super::FinishedProcessor;
use crate::crypto::keys::{KeyScheduler, Secret};
use crate::crypto::suite::CipherSuite;
use crate::protocol::message::VerifyData;
use crate::protocol::state::Established;
use crate::protocol::transcript::TranscriptHasher;
use crate::protocol::version::{HandshakeRole, ProtocolVersion};

/// What a completed Finished exchange leaves behind for the connection.
///
/// 完成的 Finished 交换为连接留下的信息。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstablishedSession {
    pub version: ProtocolVersion,
    pub role: HandshakeRole,
    pub cipher_suite: CipherSuite,
    /// Both verify_data values, kept only with secure renegotiation enabled.
    pub client_verify_data: Option<VerifyData>,
    pub server_verify_data: Option<VerifyData>,
    /// TLS 1.3 only.
    pub exporter_master_secret: Option<Secret>,
    /// TLS 1.3 only; seeds tickets for later resumption.
    pub resumption_master_secret: Option<Secret>,
}

impl<T: TranscriptHasher, K: KeyScheduler> FinishedProcessor<Established, T, K> {
    /// Returns a snapshot of the established session.
    ///
    /// 返回已建立会话的快照。
    pub fn session(&self) -> EstablishedSession {
        EstablishedSession {
            version: self.params.version,
            role: self.params.role,
            cipher_suite: self.params.cipher_suite,
            client_verify_data: self.client_verify_data.clone(),
            server_verify_data: self.server_verify_data.clone(),
            exporter_master_secret: self.exporter_master_secret.clone(),
            resumption_master_secret: self.resumption_master_secret.clone(),
        }
    }

    /// Hands the transcript and the key scheduler back to the connection.
    ///
    /// 将握手记录与密钥调度器交还给连接。
    pub fn into_parts(self) -> (EstablishedSession, T, K) {
        let session = self.session();
        (session, self.transcript, self.scheduler)
    }
}
