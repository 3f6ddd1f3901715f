//! Connection worker
//!
//! One worker per accepted connection. Each worker owns its line buffer and
//! its ledger handle; the filter (in shared mode), the ledger write guard
//! and the counters are shared with the other workers. Commands run on the
//! blocking pool since they do file I/O and may wait on the filter guard.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};
use url_filter::{
    CommandDispatcher, FileLedger, FilterSpec, FilterStore, LedgerGuard, PersistPolicy, Reply,
    SharedFilter, UrlValidator,
};

use crate::error::LineError;
use crate::line_buffer::LineBuffer;
use crate::metrics::ServerMetrics;
use crate::protocol::{self, BAD_REQUEST};

/// Everything a worker needs, shared by all workers of one server
#[derive(Debug)]
pub struct ConnectionContext {
    /// Filter used by every connection; `None` in per-connection mode
    pub shared: Option<SharedFilter>,
    pub ledger_path: PathBuf,
    /// Shared by every dispatcher writing to `ledger_path`
    pub ledger_guard: LedgerGuard,
    /// State file of the shared filter
    pub store: Option<FilterStore>,
    pub persist: PersistPolicy,
    pub validator: UrlValidator,
    pub strict: bool,
    pub metrics: Arc<ServerMetrics>,
}

impl ConnectionContext {
    fn dispatcher(&self, filter: SharedFilter) -> CommandDispatcher<FileLedger> {
        let dispatcher = CommandDispatcher::new(
            filter,
            FileLedger::open(&self.ledger_path),
            self.validator,
        )
        .with_ledger_guard(self.ledger_guard.clone());
        match &self.store {
            Some(store) => dispatcher.with_persistence(store.clone(), self.persist),
            None => dispatcher,
        }
    }
}

/// Serve one connection until the peer leaves or the connection is dropped
pub async fn serve_connection<S>(mut stream: S, peer: SocketAddr, ctx: Arc<ConnectionContext>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    ctx.metrics.record_connection_opened();
    debug!(peer = %peer, "Connection opened");

    let mut buffer = LineBuffer::new();
    if let Some(dispatcher) = open_session(&mut stream, &mut buffer, peer, &ctx).await {
        command_loop(&mut stream, &mut buffer, dispatcher, peer, &ctx).await;
    }

    let _ = stream.shutdown().await;
    ctx.metrics.record_connection_closed();
    debug!(peer = %peer, "Connection closed");
}

/// Pick the filter for this connection
///
/// In per-connection mode the first line is a filter configuration line.
/// A valid one is not answered; an invalid one gets `400` and ends the
/// session.
async fn open_session<S>(
    stream: &mut S,
    buffer: &mut LineBuffer,
    peer: SocketAddr,
    ctx: &ConnectionContext,
) -> Option<CommandDispatcher<FileLedger>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Some(shared) = &ctx.shared {
        return Some(ctx.dispatcher(shared.clone()));
    }

    let line = match buffer.read_line(stream).await {
        Ok(Some(line)) => line,
        Ok(None) => return None,
        Err(e) => {
            reject_line(stream, peer, &e, ctx).await;
            return None;
        }
    };

    let filter = line
        .parse::<FilterSpec>()
        .map_err(|e| e.to_string())
        .and_then(|spec| spec.build().map(|f| (spec, f)).map_err(|e| e.to_string()));
    match filter {
        Ok((spec, filter)) => {
            info!(peer = %peer, filter = %spec, "Per-connection filter created");
            Some(ctx.dispatcher(SharedFilter::new(filter)))
        }
        Err(e) => {
            warn!(peer = %peer, line = %line, error = %e, "Rejected filter configuration");
            ctx.metrics.record_reply(Reply::BadRequest);
            let _ = stream.write_all(BAD_REQUEST.as_bytes()).await;
            None
        }
    }
}

async fn command_loop<S>(
    stream: &mut S,
    buffer: &mut LineBuffer,
    mut dispatcher: CommandDispatcher<FileLedger>,
    peer: SocketAddr,
    ctx: &ConnectionContext,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let line = match buffer.read_line(stream).await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                reject_line(stream, peer, &e, ctx).await;
                return;
            }
        };

        let reply = match protocol::parse_line(&line) {
            Ok(command) => {
                ctx.metrics.record_command(&command);
                let job = command.clone();
                let dispatched = tokio::task::spawn_blocking(move || {
                    let reply = dispatcher.dispatch(&job);
                    (dispatcher, reply)
                })
                .await;
                let reply = match dispatched {
                    Ok((returned, reply)) => {
                        dispatcher = returned;
                        reply
                    }
                    Err(e) => {
                        warn!(peer = %peer, command = command.name(), error = %e, "Dispatch task failed, closing connection");
                        return;
                    }
                };
                debug!(peer = %peer, command = command.name(), url = %command.url(), ?reply, "Dispatched");
                reply
            }
            Err(e) => {
                debug!(peer = %peer, line = %line, error = %e, "Malformed request");
                Reply::BadRequest
            }
        };
        ctx.metrics.record_reply(reply);

        if let Err(e) = stream.write_all(protocol::render(reply).as_bytes()).await {
            debug!(peer = %peer, error = %e, "Write failed, closing connection");
            return;
        }

        if reply == Reply::BadRequest && ctx.strict {
            debug!(peer = %peer, "Strict mode, closing after malformed request");
            return;
        }
    }
}

/// Handle a line that could not be read
///
/// An oversized line is answered with `400`; a read error just ends the
/// session.
async fn reject_line<S>(stream: &mut S, peer: SocketAddr, error: &LineError, ctx: &ConnectionContext)
where
    S: AsyncWrite + Unpin,
{
    match error {
        LineError::TooLong { max } => {
            warn!(peer = %peer, max, "Request line too long, closing connection");
            ctx.metrics.record_reply(Reply::BadRequest);
            let _ = stream.write_all(BAD_REQUEST.as_bytes()).await;
        }
        LineError::Io(e) => {
            debug!(peer = %peer, error = %e, "Read failed, closing connection");
        }
    }
}
