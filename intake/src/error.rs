use securecast_client::ClientError;
use securecast_types::EnvelopeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("intake queue transport error: {0}")]
    Client(#[from] ClientError),

    #[error("intake queue returned an unusable record: {0}")]
    Envelope(#[from] EnvelopeError),
}
