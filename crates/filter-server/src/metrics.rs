//! Server counters
//!
//! Thread-safe counters shared by the accept loop and every connection
//! worker. A snapshot is logged when the server shuts down.

use std::sync::atomic::{AtomicU64, Ordering};

use url_filter::{Command, Reply};

#[derive(Debug, Default)]
pub struct ServerMetrics {
    /// Connections accepted
    pub connections_accepted: AtomicU64,
    /// Connections closed (by either side)
    pub connections_closed: AtomicU64,
    /// POST requests dispatched
    pub posts: AtomicU64,
    /// GET requests dispatched
    pub gets: AtomicU64,
    /// DELETE requests dispatched
    pub deletes: AtomicU64,
    /// Requests answered with 400
    pub bad_requests: AtomicU64,
    /// Insertions whose state write failed
    pub persist_failures: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a parsed command
    pub fn record_command(&self, command: &Command) {
        let counter = match command {
            Command::Post(_) => &self.posts,
            Command::Get(_) => &self.gets,
            Command::Delete(_) => &self.deletes,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the reply sent for a request
    pub fn record_reply(&self, reply: Reply) {
        match reply {
            Reply::BadRequest => {
                self.bad_requests.fetch_add(1, Ordering::Relaxed);
            }
            Reply::Created {
                persist_failed: true,
            } => {
                self.persist_failures.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            posts: self.posts.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            bad_requests: self.bad_requests.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ServerMetrics`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub connections_closed: u64,
    pub posts: u64,
    pub gets: u64,
    pub deletes: u64,
    pub bad_requests: u64,
    pub persist_failures: u64,
}
