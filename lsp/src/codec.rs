//! `Content-Length` framing for JSON-RPC over a byte stream.
//!
//! [`FrameReader`] pulls one JSON value per frame off the editor's stdin;
//! [`FrameWriter`] frames outgoing values for its stdout.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Frames larger than this are refused before allocating.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("I/O on JSON-RPC stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("stream ended inside a frame header")]
    TruncatedHeader,

    #[error("frame has no Content-Length header")]
    MissingLength,

    #[error("invalid Content-Length {0:?}")]
    InvalidLength(String),

    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    Oversized(usize),

    #[error("frame body is not JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct FrameReader<R> {
    reader: BufReader<R>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }

    /// Next frame, or `None` when the stream closes between frames.
    pub async fn read_frame(&mut self) -> Result<Option<serde_json::Value>, CodecError> {
        let Some(length) = self.read_length().await? else {
            return Ok(None);
        };
        if length > MAX_FRAME_BYTES {
            return Err(CodecError::Oversized(length));
        }

        let mut body = vec![0u8; length];
        self.reader.read_exact(&mut body).await?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn read_length(&mut self) -> Result<Option<usize>, CodecError> {
        let mut length = None;
        let mut line = String::new();
        let mut started = false;

        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                // A close before any header byte is a clean end of session.
                return if started {
                    Err(CodecError::TruncatedHeader)
                } else {
                    Ok(None)
                };
            }
            started = true;

            let header = line.trim();
            if header.is_empty() {
                break;
            }
            let Some((name, value)) = header.split_once(':') else {
                continue;
            };
            if name.trim().eq_ignore_ascii_case("Content-Length") {
                let value = value.trim();
                length = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| CodecError::InvalidLength(value.to_string()))?,
                );
            }
        }

        length.map(Some).ok_or(CodecError::MissingLength)
    }
}

pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub async fn write_frame(&mut self, message: &serde_json::Value) -> Result<(), CodecError> {
        let body = serde_json::to_vec(message)?;
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(&body).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
