//! Background refresh task.
//!
//! Periodically re-scrapes a configured topic list so the store stays
//! warm without caller traffic. Each topic failure is logged and skipped;
//! the loop itself never stops.

use std::time::Duration;

use paperdex_engine::RetrievalEngine;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::handlers::DEFAULT_MAX_RESULTS;

pub fn spawn_refresh(
    engine: RetrievalEngine,
    topics: Vec<String>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(topics = topics.len(), interval_secs = every.as_secs(), "Refresh task started");

        loop {
            ticker.tick().await;
            for topic in &topics {
                match engine.scrape_and_store(topic, DEFAULT_MAX_RESULTS).await {
                    Ok(summary) => {
                        info!(topic = %topic, papers = summary.stored_papers, "Refreshed topic");
                    }
                    Err(e) => {
                        warn!(topic = %topic, error = %e, "Topic refresh failed, continuing");
                    }
                }
            }
        }
    })
}
