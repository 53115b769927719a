//! States of the Finished exchange.
//!
//! The marker types are zero-sized and only parameterize
//! [`FinishedProcessor`](crate::handshake::FinishedProcessor), so that each
//! state exposes exactly the operations valid in it. [`SessionState`] is the
//! runtime view of the same states used by the driver.
//!
//! Finished 交换的各个状态。
//!
//! 标记类型为零大小类型，仅用于参数化 `FinishedProcessor`，
//! 使每个状态只暴露在该状态下合法的操作。[`SessionState`] 是驱动器使用的同一组状态的运行时视图。

/// Neither Finished message has been exchanged yet.
#[derive(Debug)]
pub struct Ready;

/// The local Finished was sent; the peer's is awaited.
#[derive(Debug)]
pub struct LocalFinishSent;

/// The peer's Finished was verified; the local one is still to be sent.
#[derive(Debug)]
pub struct PeerFinishVerified;

/// Both Finished messages were exchanged and verified.
#[derive(Debug)]
pub struct Established;

/// States in which the peer's Finished (and, before TLS 1.3, its
/// ChangeCipherSpec) is still expected.
pub trait AwaitingPeerFinish {}

impl AwaitingPeerFinish for Ready {}
impl AwaitingPeerFinish for LocalFinishSent {}

/// Runtime state of a Finished exchange.
///
/// Finished 交换的运行时状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// This side sends the first Finished and has not yet done so.
    AwaitingLocalFinish,
    LocalFinishSent,
    /// This side receives the first Finished and has not yet done so.
    AwaitingPeerFinish,
    Verified,
    Established,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Established | SessionState::Aborted)
    }
}
