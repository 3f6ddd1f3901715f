//! Command server
//!
//! Binds the listener, restores the shared filter and runs the accept loop.
//! Every accepted connection is served by its own task.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use url_filter::{
    FilterStore, LedgerGuard, PersistPolicy, RestoreOutcome, SharedFilter, StoreError,
};

use crate::config::{FilterMode, ServerConfig};
use crate::connection::{serve_connection, ConnectionContext};
use crate::error::ServerError;
use crate::metrics::ServerMetrics;

/// Pause after a failed accept before trying again
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct CommandServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    context: Arc<ConnectionContext>,
}

impl CommandServer {
    /// Validate `config`, restore the shared filter and bind the listener
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;

        let (shared, store) = match config.mode {
            FilterMode::Shared => {
                let store = FilterStore::new(&config.state_file, config.codec);
                let mut filter = config.filter.build()?;
                match store.restore(&mut filter) {
                    Ok(RestoreOutcome::Restored) | Ok(RestoreOutcome::Missing) => {}
                    Err(StoreError::Corrupted(e)) => {
                        warn!(
                            path = %store.path().display(),
                            error = %e,
                            "Filter state file is corrupted, continuing with {} bits",
                            filter.size()
                        );
                    }
                    Err(StoreError::Io(e)) => {
                        warn!(path = %store.path().display(), error = %e, "Could not read filter state file");
                    }
                }
                info!(
                    size = filter.size(),
                    hash_functions = filter.hash_functions().len(),
                    bits_set = filter.bits_set(),
                    estimated_fpr = filter.estimated_fpr(),
                    "Shared filter ready"
                );
                (Some(SharedFilter::new(filter)), Some(store))
            }
            FilterMode::PerConnection => (None, None),
        };

        let listener = TcpListener::bind(config.listen_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.listen_addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        info!(
            addr = %local_addr,
            filter = %config.filter,
            mode = ?config.mode,
            codec = %config.codec,
            persist = %config.persist,
            strict = config.strict,
            "Filter server listening"
        );

        let context = Arc::new(ConnectionContext {
            shared,
            ledger_path: config.ledger_path,
            ledger_guard: LedgerGuard::new(),
            store,
            persist: config.persist,
            validator: config.validator,
            strict: config.strict,
            metrics: Arc::new(ServerMetrics::new()),
        });

        Ok(Self {
            listener,
            local_addr,
            context,
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The filter shared by all connections, if running in shared mode
    pub fn shared_filter(&self) -> Option<SharedFilter> {
        self.context.shared.clone()
    }

    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.context.metrics)
    }

    /// Serve until the process is killed
    pub async fn run(self) {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Serve until `shutdown` completes, then checkpoint the shared filter
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Received shutdown signal");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let context = Arc::clone(&self.context);
                        tokio::spawn(serve_connection(stream, peer, context));
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to accept connection");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                }
            }
        }

        self.checkpoint();
        info!(metrics = ?self.context.metrics.snapshot(), "Filter server stopped");
    }

    fn checkpoint(&self) {
        if self.context.persist == PersistPolicy::Never {
            return;
        }
        if let (Some(shared), Some(store)) = (&self.context.shared, &self.context.store) {
            match shared.checkpoint(store) {
                Ok(()) => info!(path = %store.path().display(), "Filter state saved"),
                Err(e) => error!(path = %store.path().display(), error = %e, "Failed to save filter state"),
            }
        }
    }
}
