use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("configuration error: no render target attached")]
    MissingRenderTarget,

    #[error("configuration error: `{operation}` is not implemented by the {geometry} geometry")]
    Unsupported {
        geometry: &'static str,
        operation: &'static str,
    },

    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

impl ChartError {
    /// Returns `true` for programmer errors raised while configuring or
    /// wiring a chart, as opposed to problems with the data itself.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::MissingRenderTarget | Self::Unsupported { .. }
        )
    }
}
