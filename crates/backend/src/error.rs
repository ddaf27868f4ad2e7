/// Errors from the generation backend layer.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response archive could not be decoded.
    #[error("Malformed image archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Reading an archive entry failed.
    #[error("I/O error reading image: {0}")]
    Io(#[from] std::io::Error),

    /// A session could not be opened (missing credentials, etc.).
    #[error("Session error: {0}")]
    Session(String),

    /// The backend finished without producing any image.
    #[error("Image generation failed: backend produced no output")]
    NoOutput,

    /// Any other failure reported by a backend implementation.
    #[error("{0}")]
    Other(String),
}
