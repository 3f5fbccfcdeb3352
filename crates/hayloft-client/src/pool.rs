use std::ops::Deref;
use std::sync::Arc;

use crossbeam::channel::{Receiver, Sender};

use hayloft_store::{StoreClient, StoreError};

use crate::config::ClientConfig;
use crate::schema::SchemaRegistry;
use crate::table::Client;

/// Fixed-size pool of client handles over independent store connections.
///
/// Handles check out on [`get`](ClientPool::get) and return on drop, so a
/// connection is held exactly for the span of use. Every pooled handle
/// shares one schema registry.
pub struct ClientPool<S: StoreClient> {
    sender: Sender<Client<S>>,
    receiver: Receiver<Client<S>>,
}

impl<S: StoreClient> ClientPool<S> {
    pub fn new<F>(size: usize, connect: F) -> Result<Self, StoreError>
    where
        F: Fn() -> Result<S, StoreError>,
    {
        Self::with_config(size, ClientConfig::default(), connect)
    }

    pub fn with_config<F>(
        size: usize,
        config: ClientConfig,
        connect: F,
    ) -> Result<Self, StoreError>
    where
        F: Fn() -> Result<S, StoreError>,
    {
        let (sender, receiver) = crossbeam::channel::bounded(size);
        let registry = Arc::new(SchemaRegistry::new());
        for _ in 0..size {
            let client = Client::with_registry(connect()?, config.clone(), registry.clone());
            sender
                .send(client)
                .map_err(|e| StoreError::Storage(e.to_string()))?;
        }
        Ok(Self { sender, receiver })
    }

    /// Check a handle out; blocks until one is free.
    pub fn get(&self) -> Result<PooledClient<'_, S>, StoreError> {
        let client = self
            .receiver
            .recv()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        Ok(PooledClient {
            client: Some(client),
            pool: &self.sender,
        })
    }
}

pub struct PooledClient<'a, S: StoreClient> {
    client: Option<Client<S>>,
    pool: &'a Sender<Client<S>>,
}

impl<S: StoreClient> Deref for PooledClient<'_, S> {
    type Target = Client<S>;

    fn deref(&self) -> &Client<S> {
        // client is always Some until Drop runs, and Deref cannot be
        // called after Drop
        self.client.as_ref().expect("BUG: client already consumed")
    }
}

impl<S: StoreClient> Drop for PooledClient<'_, S> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            let _ = self.pool.send(client);
        }
    }
}
