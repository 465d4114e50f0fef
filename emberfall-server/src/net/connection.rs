use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

/// A single frame may not exceed this many bytes including the
/// newline.
pub const MAX_FRAME_BYTES: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("peer disconnected")]
    Disconnect,

    #[error("frame exceeds {MAX_FRAME_BYTES} bytes")]
    FrameTooLarge,

    #[error("malformed frame: {0}")]
    BadJson(#[from] serde_json::Error),
}

/// Newline-delimited JSON over TCP: one object per line in, one per
/// line out.
pub struct Connection {
    stream: BufWriter<TcpStream>,
    buffer: BytesMut,
}

impl Connection {
    pub fn new(socket: TcpStream) -> Self {
        Self {
            stream: BufWriter::new(socket),
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    pub async fn shutdown(&mut self) {
        let _ = self.stream.shutdown().await;
    }

    /// Read the next frame, skipping blank lines. The returned value
    /// is untyped so the caller can log and drop unknown `type`s
    /// without killing the session.
    pub async fn read_frame(&mut self) -> Result<serde_json::Value, ProtocolError> {
        loop {
            if let Some(newline) = self.buffer.iter().position(|&byte| byte == b'\n') {
                let line = self.buffer.split_to(newline + 1);
                let line = &line[..newline];
                let trimmed = std::str::from_utf8(line)
                    .map_err(|_| ProtocolError::Disconnect)?
                    .trim();
                if trimmed.is_empty() {
                    continue;
                }
                return Ok(serde_json::from_str(trimmed)?);
            }

            if self.buffer.len() > MAX_FRAME_BYTES {
                return Err(ProtocolError::FrameTooLarge);
            }

            match self.stream.read_buf(&mut self.buffer).await {
                Ok(0) => return Err(ProtocolError::Disconnect),
                Ok(_) => {}
                Err(_) => return Err(ProtocolError::Disconnect),
            }
        }
    }

    /// Write one already-serialised frame plus its terminator.
    pub async fn write_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        if self.stream.write_all(line.as_bytes()).await.is_err() {
            return Err(ProtocolError::Disconnect);
        }
        if self.stream.write_all(b"\n").await.is_err() {
            return Err(ProtocolError::Disconnect);
        }
        if self.stream.flush().await.is_err() {
            return Err(ProtocolError::Disconnect);
        }
        Ok(())
    }
}
