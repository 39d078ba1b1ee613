//! Client registry
//!
//! The single source of truth for who is online: username → outbound
//! connection handle. The registry is owned by the `ChatServer` actor, which
//! serializes every call, so each method here runs as one atomic step.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::client::ConnectionHandle;
use crate::error::SendError;
use crate::types::{ConnectionId, Username};

/// Registered client
#[derive(Debug)]
struct Entry {
    handle: ConnectionHandle,
    /// Join sequence number, used to list users in join order
    joined: u64,
}

/// Username → connection mapping
#[derive(Debug, Default)]
pub struct ClientRegistry {
    entries: HashMap<Username, Entry>,
    next_seq: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client
    ///
    /// Returns false without touching the registry if the name is taken.
    pub fn add(&mut self, username: Username, handle: ConnectionHandle) -> bool {
        if self.entries.contains_key(&username) {
            return false;
        }

        let joined = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(username, Entry { handle, joined });
        true
    }

    /// Remove a client by name; no-op if absent
    pub fn remove(&mut self, username: &str) -> bool {
        match self.entries.remove(username) {
            Some(entry) => {
                entry.handle.close();
                true
            }
            None => false,
        }
    }

    /// Remove a client only if `id` still owns the name
    ///
    /// A connection that was evicted must not remove a newer client that
    /// registered under the same name in the meantime.
    pub fn release(&mut self, username: &str, id: ConnectionId) -> bool {
        if self.owns(username, id) {
            self.remove(username)
        } else {
            false
        }
    }

    /// Check whether `username` is registered to connection `id`
    pub fn owns(&self, username: &str, id: ConnectionId) -> bool {
        self.entries
            .get(username)
            .is_some_and(|entry| entry.handle.id == id)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.entries.contains_key(username)
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Registered usernames in join order
    pub fn snapshot_names(&self) -> Vec<Username> {
        let mut names: Vec<(&Username, u64)> = self
            .entries
            .iter()
            .map(|(name, entry)| (name, entry.joined))
            .collect();
        names.sort_by_key(|&(_, joined)| joined);
        names.into_iter().map(|(name, _)| name.clone()).collect()
    }

    /// Deliver a line to one client
    ///
    /// A failed send evicts the client before the error is returned.
    pub fn send_to(&mut self, username: &str, line: &str) -> Result<(), SendError> {
        let entry = self.entries.get(username).ok_or(SendError::NotFound)?;

        if let Err(e) = entry.handle.send(line) {
            warn!("Send to '{}' failed, evicting", username);
            self.remove(username);
            return Err(e);
        }
        Ok(())
    }

    /// Deliver a line to every client except `exclude`
    ///
    /// Clients whose send fails are evicted after the pass over the map and
    /// returned to the caller.
    pub fn broadcast(&mut self, line: &str, exclude: Option<&str>) -> Vec<Username> {
        let failed: Vec<Username> = self
            .entries
            .iter()
            .filter(|(name, _)| Some(name.as_str()) != exclude)
            .filter(|(_, entry)| entry.handle.send(line).is_err())
            .map(|(name, _)| name.clone())
            .collect();

        for name in &failed {
            warn!("Broadcast to '{}' failed, evicting", name);
            self.remove(name.as_str());
        }

        if !failed.is_empty() {
            debug!("Total clients after eviction: {}", self.count());
        }

        failed
    }
}
