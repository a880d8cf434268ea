//! IPC server for the resourced daemon.

use std::path::Path;
use std::sync::Arc;

use resourced_proto::codec;
use resourced_proto::types::IpcFrame;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::ManagerCore;
use crate::service::ManagerService;

/// Start the daemon IPC server on a Unix domain socket.
///
/// Each accepted connection is assigned a unique sender identity; that
/// identity is the caller for every client registered over the
/// connection.
///
/// # Errors
///
/// Returns an error if the socket cannot be bound or if filesystem
/// operations on the socket path fail.
pub async fn serve(
	socket_path: impl AsRef<Path>,
	core: Arc<ManagerCore>,
	shutdown: CancellationToken,
) -> std::io::Result<()> {
	// Remove existing socket file
	let path = socket_path.as_ref();
	if path.exists() {
		tokio::fs::remove_file(path).await?;
	}

	let listener = UnixListener::bind(path)?;
	tracing::info!(path = %path.display(), "resourced IPC server listening");

	let mut next_sender: u64 = 1;
	loop {
		tokio::select! {
			_ = shutdown.cancelled() => {
				tracing::info!("resourced IPC server shutting down");
				break;
			}
			res = listener.accept() => {
				match res {
					Ok((stream, _addr)) => {
						let sender = format!(":1.{next_sender}");
						next_sender += 1;
						tokio::spawn(handle_connection(stream, core.clone(), sender));
					}
					Err(e) => {
						tracing::error!(error = %e, "failed to accept connection");
					}
				}
			}
		}
	}

	Ok(())
}

/// Handle a single IPC connection from a client process.
pub(crate) async fn handle_connection(stream: UnixStream, core: Arc<ManagerCore>, sender: String) {
	tracing::info!(sender, "new connection");

	let (read_half, write_half) = stream.into_split();
	let (tx, mut rx) = mpsc::unbounded_channel::<IpcFrame>();
	let mut service = ManagerService::new(core, sender.clone(), tx);

	let writer = tokio::spawn(async move {
		let mut write_half = write_half;
		while let Some(frame) = rx.recv().await {
			if codec::write_frame(&mut write_half, &frame).await.is_err() {
				break;
			}
		}
	});

	let mut reader = tokio::io::BufReader::new(read_half);
	loop {
		match codec::read_frame(&mut reader).await {
			Ok(IpcFrame::Request(req)) => service.handle_request(req),
			Ok(_) => tracing::warn!(sender, "unexpected frame from client"),
			Err(e) => {
				if e.kind() != std::io::ErrorKind::UnexpectedEof {
					tracing::warn!(sender, error = %e, "connection read error");
				}
				break;
			}
		}
	}

	// Dropping the service tears down this connection's clients; the writer
	// exits once the last sink clone of the outbound channel is gone.
	drop(service);
	let _ = writer.await;

	tracing::info!(sender, "connection closed");
}

/// Connect to the daemon as a client.
///
/// # Errors
///
/// Returns an error if the socket is not reachable.
pub async fn connect(socket_path: impl AsRef<Path>) -> std::io::Result<UnixStream> {
	UnixStream::connect(socket_path).await
}

#[cfg(test)]
mod tests {
	use resourced_proto::codec::{read_frame, write_frame};
	use resourced_proto::resources;
	use resourced_proto::types::{
		ArgValue, ERROR_NONE, Event, MethodCall, NotifyEvent, RTYPE_GRANT, Request, RequestId,
		Response, STATUS_ACTIVE,
	};

	use super::*;
	use crate::security::AllowAll;

	async fn call(
		stream: &mut UnixStream,
		seq: u64,
		member: &str,
		args: Vec<ArgValue>,
	) -> std::io::Result<()> {
		write_frame(
			stream,
			&IpcFrame::Request(Request {
				id: RequestId(seq),
				call: MethodCall::new(member, args),
			}),
		)
		.await
	}

	fn register_args(priority: u32) -> Vec<ArgValue> {
		vec![
			ArgValue::I32(0),
			ArgValue::U32(0),
			ArgValue::U32(1),
			ArgValue::U32(0),
			ArgValue::U32(0),
			ArgValue::U32(0),
			ArgValue::U32(0),
			ArgValue::Str("player".to_string()),
			ArgValue::Str("".to_string()),
			ArgValue::U32(priority),
		]
	}

	fn request_args(id: u32, reqno: u32, resource: &str) -> Vec<ArgValue> {
		vec![
			ArgValue::I32(3),
			ArgValue::U32(id),
			ArgValue::U32(reqno),
			ArgValue::StrList(vec![resource.to_string()]),
		]
	}

	/// Read frames until the next response, skipping events on the way.
	async fn read_until_response(stream: &mut UnixStream) -> std::io::Result<Response> {
		loop {
			if let IpcFrame::Response(resp) = read_frame(stream).await? {
				return Ok(resp);
			}
		}
	}

	#[tokio::test]
	async fn register_request_acquire_roundtrip() -> std::io::Result<()> {
		let core = ManagerCore::new(Arc::new(AllowAll));
		let (mut client, server) = UnixStream::pair()?;
		let server_task = tokio::spawn(handle_connection(server, core, ":1.1".to_string()));

		call(&mut client, 1, "register", register_args(5)).await?;
		let IpcFrame::Response(Response { request_id, reply }) = read_frame(&mut client).await?
		else {
			panic!("expected response frame");
		};
		assert_eq!(request_id, RequestId(1));
		assert_eq!(reply.id, 1);
		assert_eq!(reply.error, ERROR_NONE);

		call(&mut client, 2, "request", request_args(1, 2, resources::AUDIO_PLAYBACK)).await?;
		let mut saw_granted = false;
		let mut saw_status = false;
		loop {
			match read_frame(&mut client).await? {
				IpcFrame::Event(Event::Notify {
					event: NotifyEvent::Granted,
					resource,
					..
				}) => {
					assert_eq!(resource, resources::AUDIO_PLAYBACK);
					saw_granted = true;
				}
				IpcFrame::Event(Event::Status { status, .. }) => {
					assert_eq!(status, STATUS_ACTIVE);
					saw_status = true;
				}
				IpcFrame::Response(resp) => {
					assert_eq!(resp.request_id, RequestId(2));
					assert_eq!(resp.reply.error, ERROR_NONE);
					break;
				}
				other => panic!("unexpected frame: {other:?}"),
			}
		}
		assert!(saw_granted);
		assert!(saw_status);

		call(&mut client, 3, "acquire", vec![
			ArgValue::I32(3),
			ArgValue::U32(1),
			ArgValue::U32(3),
			ArgValue::U32(1024),
		])
		.await?;
		let frame = read_frame(&mut client).await?;
		assert!(matches!(frame, IpcFrame::Response(_)), "reply precedes grant");
		let IpcFrame::Event(Event::Grant {
			rtype,
			id,
			reqno,
			mask,
			..
		}) = read_frame(&mut client).await?
		else {
			panic!("expected grant call");
		};
		assert_eq!((rtype, id, reqno, mask), (RTYPE_GRANT, 1, 3, 1024));

		drop(client);
		server_task.await.expect("server task panicked");
		Ok(())
	}

	#[tokio::test]
	async fn disconnect_releases_client_resources() -> std::io::Result<()> {
		let core = ManagerCore::new(Arc::new(AllowAll));
		let (mut client, server) = UnixStream::pair()?;
		let server_task =
			tokio::spawn(handle_connection(server, core.clone(), ":1.1".to_string()));

		call(&mut client, 1, "register", register_args(5)).await?;
		read_until_response(&mut client).await?;
		call(&mut client, 2, "request", request_args(1, 2, resources::DISPLAY)).await?;
		read_until_response(&mut client).await?;

		assert!(core.is_owner(resources::DISPLAY, resourced_proto::types::ClientId(1)));

		drop(client);
		server_task.await.expect("server task panicked");

		assert_eq!(core.client_count(), 0);
		let (_, owners) = core.get_state();
		assert!(owners.is_empty());
		Ok(())
	}

	#[tokio::test]
	async fn serve_binds_socket_and_accepts() -> std::io::Result<()> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("resourced.sock");
		let core = ManagerCore::new(Arc::new(AllowAll));
		let shutdown = CancellationToken::new();
		let server = tokio::spawn(serve(path.clone(), core, shutdown.clone()));

		let mut stream = loop {
			match connect(&path).await {
				Ok(s) => break s,
				Err(_) => tokio::task::yield_now().await,
			}
		};

		call(&mut stream, 1, "register", register_args(1)).await?;
		let resp = read_until_response(&mut stream).await?;
		assert_eq!(resp.reply.error, ERROR_NONE);

		shutdown.cancel();
		server.await.expect("server task panicked")?;
		Ok(())
	}
}
