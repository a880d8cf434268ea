//! Length-prefixed postcard framing for IPC connections.
//!
//! Each frame is a little-endian u32 byte length followed by the postcard
//! encoding of an [`IpcFrame`].

use std::io::{Error as IoError, ErrorKind};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::IpcFrame;

/// Upper bound on a single frame's encoded length.
pub const MAX_FRAME_LEN: u32 = 64 * 1024;

/// Encode and write one frame.
///
/// # Errors
///
/// Returns an error if encoding fails or the underlying write fails.
pub async fn write_frame<W: AsyncWrite + Unpin>(
	writer: &mut W,
	frame: &IpcFrame,
) -> std::io::Result<()> {
	let buf = postcard::to_allocvec(frame)
		.map_err(|e| IoError::new(ErrorKind::InvalidData, e.to_string()))?;
	writer.write_u32_le(buf.len() as u32).await?;
	writer.write_all(&buf).await?;
	writer.flush().await?;
	Ok(())
}

/// Read and decode one frame.
///
/// # Errors
///
/// Returns an error on EOF, on a frame exceeding [`MAX_FRAME_LEN`], or on
/// a payload that does not decode to an [`IpcFrame`].
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<IpcFrame> {
	let len = reader.read_u32_le().await?;
	if len > MAX_FRAME_LEN {
		return Err(IoError::new(ErrorKind::InvalidData, "frame too large"));
	}
	let mut buf = vec![0u8; len as usize];
	reader.read_exact(&mut buf).await?;
	postcard::from_bytes(&buf).map_err(|e| IoError::new(ErrorKind::InvalidData, e.to_string()))
}
