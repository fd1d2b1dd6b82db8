// src/simulator.rs
//! Simulated market feed. Prices follow an unbounded random walk: every tick
//! nudges each quote by at most `PRICE_STEP` and draws a fresh 24h change.

use crate::models::MarketQuote;
use log::{debug, info};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Largest distance a price can move in one tick.
pub const PRICE_STEP: f64 = 0.005;
const CHANGE_RANGE: f64 = 1.0;

pub struct MarketSimulator {
    quotes: Vec<MarketQuote>,
}

impl MarketSimulator {
    pub fn new(quotes: Vec<MarketQuote>) -> Self {
        Self { quotes }
    }

    pub fn quotes(&self) -> &[MarketQuote] {
        &self.quotes
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for quote in self.quotes.iter_mut() {
            quote.price += rng.random_range(-PRICE_STEP..PRICE_STEP);
            quote.change = rng.random_range(-CHANGE_RANGE..CHANGE_RANGE);
        }
    }
}

/// Shared view of the simulator. Cloning shares the same quotes.
#[derive(Clone)]
pub struct QuoteFeed {
    simulator: Arc<RwLock<MarketSimulator>>,
    updates: broadcast::Sender<Vec<MarketQuote>>,
}

impl QuoteFeed {
    pub fn new(quotes: Vec<MarketQuote>) -> Self {
        let (updates, _) = broadcast::channel(16);
        Self {
            simulator: Arc::new(RwLock::new(MarketSimulator::new(quotes))),
            updates,
        }
    }

    pub async fn snapshot(&self) -> Vec<MarketQuote> {
        self.simulator.read().await.quotes().to_vec()
    }

    /// Applies one tick and publishes the result to subscribers.
    pub async fn refresh(&self) -> Vec<MarketQuote> {
        let snapshot = {
            let mut simulator = self.simulator.write().await;
            let mut rng = rand::rng();
            simulator.tick(&mut rng);
            simulator.quotes().to_vec()
        };
        // No subscribers is fine.
        let _ = self.updates.send(snapshot.clone());
        snapshot
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Vec<MarketQuote>> {
        self.updates.subscribe()
    }
}

pub struct SimulatorHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SimulatorHandle {
    /// Cancels the timer and waits for the task to exit.
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        let _ = self.task.await;
    }
}

/// Starts the refresh timer. The first tick lands one `period` after start.
pub fn spawn(feed: QuoteFeed, period: Duration) -> SimulatorHandle {
    let (stop, mut stopped) = oneshot::channel();
    let task = tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        info!("Market simulator running every {:?}", period);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let quotes = feed.refresh().await;
                    debug!("Refreshed {} quotes", quotes.len());
                }
                _ = &mut stopped => {
                    info!("Market simulator stopped");
                    break;
                }
            }
        }
    });
    SimulatorHandle { stop, task }
}
