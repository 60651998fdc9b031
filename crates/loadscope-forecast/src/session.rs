// ── Stats server session transport ──
//
// One session is one TCP connection speaking the line-oriented text-eval
// protocol: a command terminated by '\n' goes out, exactly one reply line
// comes back. Replies starting with "Error" are evaluation failures.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::trace;

use crate::error::ForecastError;

/// A single stateful evaluation session against the stats server.
///
/// Variables assigned by one `eval` stay visible to later ones on the same
/// session, which is what the ARIMA sequence relies on.
pub struct StatsSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl StatsSession {
    /// Open a new session to the stats server.
    pub async fn connect(host: &str, port: u16) -> Result<Self, ForecastError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|source| ForecastError::Connect {
                host: host.to_string(),
                port,
                source,
            })?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// Evaluate one command and return the reply line.
    pub async fn eval(&mut self, command: &str) -> Result<String, ForecastError> {
        trace!(command, "stats eval");
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(ForecastError::SessionClosed);
        }
        let reply = line.trim_end().to_string();
        if reply.starts_with("Error") {
            return Err(ForecastError::Eval {
                command: command.to_string(),
                message: reply,
            });
        }
        Ok(reply)
    }

    /// Shut down the write side; the server tears the session down.
    pub async fn shutdown(&mut self) -> Result<(), ForecastError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
