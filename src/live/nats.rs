use anyhow::{Context, Result};
use async_nats::Client;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::client::LiveClient;
use super::messages::RealtimeInputMessage;
use crate::capture::AudioChunk;

/// NATS-backed live session client
///
/// Realtime input goes out on `live.input.<session_id>`; agent turns come
/// back on `live.turns.<session_id>`.
pub struct NatsLiveClient {
    url: String,
    session_id: String,
    client: Mutex<Option<Client>>,
    connected: AtomicBool,
    sequence: AtomicU32,
}

impl NatsLiveClient {
    pub fn new(url: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            session_id: session_id.into(),
            client: Mutex::new(None),
            connected: AtomicBool::new(false),
            sequence: AtomicU32::new(0),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Subscribe to conversation turns published by the remote agent.
    pub async fn subscribe_turns(&self) -> Result<async_nats::Subscriber> {
        let client = {
            let guard = self.client.lock().await;
            guard.clone().context("Not connected to live session")?
        };

        let subject = format!("live.turns.{}", self.session_id);
        let subscriber = client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe to turns")?;

        info!("Subscribed to {}", subject);

        Ok(subscriber)
    }
}

#[async_trait::async_trait]
impl LiveClient for NatsLiveClient {
    async fn connect(&self) -> Result<()> {
        let mut guard = self.client.lock().await;
        if guard.is_some() {
            debug!("Live session already connected");
            return Ok(());
        }

        info!("Connecting to live session at {}", self.url);

        let client = async_nats::connect(&self.url)
            .await
            .context("Failed to connect to live session")?;

        *guard = Some(client);
        self.connected.store(true, Ordering::SeqCst);
        self.sequence.store(0, Ordering::SeqCst);

        info!("Live session connected");

        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut guard = self.client.lock().await;
        self.connected.store(false, Ordering::SeqCst);

        // async-nats handles cleanup on drop.
        if guard.take().is_some() {
            info!("Live session disconnected");
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send_realtime_input(&self, chunks: Vec<AudioChunk>) -> Result<()> {
        let client = {
            let guard = self.client.lock().await;
            match guard.clone() {
                Some(c) => c,
                None => {
                    // Contract: no-op when not connected.
                    debug!("Dropping {} chunk(s): not connected", chunks.len());
                    return Ok(());
                }
            }
        };

        let subject = format!("live.input.{}", self.session_id);

        for chunk in chunks {
            let message = RealtimeInputMessage {
                session_id: self.session_id.clone(),
                mime_type: chunk.mime_type,
                data: chunk.data,
                sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
                timestamp: chrono::Utc::now().to_rfc3339(),
            };

            let payload = serde_json::to_vec(&message)?;

            client
                .publish(subject.clone(), payload.into())
                .await
                .context("Failed to publish realtime input")?;
        }

        Ok(())
    }
}
