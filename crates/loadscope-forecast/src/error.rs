use thiserror::Error;

/// Top-level error type for the `loadscope-forecast` crate.
///
/// Covers connection setup, per-command evaluation, and reply decoding.
/// A failed evaluation does not poison the session; the pool hands it out
/// again on the next acquire.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// TCP connection to the stats server could not be established.
    #[error("Connection to stats server {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on an established session.
    #[error("Stats session I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server closed the connection mid-session.
    #[error("Stats server closed the session")]
    SessionClosed,

    /// The server reported an evaluation error for a command.
    #[error("Evaluation of `{command}` failed: {message}")]
    Eval { command: String, message: String },

    /// A token in a numeric reply could not be decoded as a double.
    #[error("Unparseable token in numeric reply: `{token}`")]
    NumericReply { token: String },

    /// The pool has been closed; no further sessions can be acquired.
    #[error("Session pool is closed")]
    PoolClosed,

    /// A semaphore permit was granted but no session slot was free.
    /// Indicates a bookkeeping bug rather than an operational condition.
    #[error("Session pool exhausted despite free capacity")]
    Exhausted,
}
