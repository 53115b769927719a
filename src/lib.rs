pub mod crypto;
pub mod error;
pub mod handshake;
pub mod protocol;

pub use error::{HandshakeError, Result};
pub use handshake::{
    EstablishedSession, FinishDriver, FinishedProcessor, FinishedProcessorBuilder,
    NegotiatedParams,
};
