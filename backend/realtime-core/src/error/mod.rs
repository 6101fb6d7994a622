pub mod codec;
pub mod config;
pub mod realtime;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Codec(#[from] codec::CodecError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Realtime(#[from] realtime::RealtimeError),
}
