use crate::Result;
use crossbeam_channel::{Receiver, Sender};
use reqwest::blocking::Client;
use std::thread;

/// A finished tile download
#[derive(Debug, Clone)]
pub struct TileResponse {
    pub url: String,
    pub data: Vec<u8>,
}

/// Fetches tiles on detached threads and reports finished downloads over a
/// channel, so the render loop never blocks on the network.
pub struct TileLoader {
    client: Client,
    tx: Sender<TileResponse>,
    rx: Receiver<TileResponse>,
}

impl TileLoader {
    /// Builds the shared blocking client. Public tile servers reject requests
    /// without a User-Agent.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("vs30-map/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let (tx, rx) = crossbeam_channel::unbounded();
        Ok(Self { client, tx, rx })
    }

    /// Starts downloading `url` in the background
    pub fn start_download(&self, url: String) {
        let client = self.client.clone();
        let tx = self.tx.clone();

        thread::spawn(move || {
            const MAX_ATTEMPTS: usize = 2;
            for attempt in 1..=MAX_ATTEMPTS {
                log::debug!("fetch tile {} attempt {}", url, attempt);
                match fetch(&client, &url) {
                    Ok(data) => {
                        log::debug!("downloaded tile {} ({} bytes)", url, data.len());
                        let _ = tx.send(TileResponse { url, data });
                        return;
                    }
                    Err(e) => {
                        log::warn!("tile {} download failed on attempt {}: {}", url, attempt, e);
                        if attempt < MAX_ATTEMPTS {
                            thread::sleep(std::time::Duration::from_millis(100));
                        }
                    }
                }
            }
            log::error!("giving up on tile {}", url);
        });
    }

    /// Drains every download finished since the last call
    pub fn poll(&self) -> Vec<TileResponse> {
        self.rx.try_iter().collect()
    }
}

fn fetch(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = client.get(url).send()?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}
