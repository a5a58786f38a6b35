/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

use std::{fmt, sync::atomic::{AtomicU64,Ordering}, time::Duration};
use async_trait::async_trait;
use tracing::{debug,warn};

use crate::{GeoPos, Observation};
use crate::errors::{feed_unavailable, Result};

/// the abstraction of a state vector source.
/// Implementations only have to retrieve and decode. Timeouts and statistics are handled
/// by [`query_feed`]. This is also the seam through which tests inject mock feeds
#[async_trait]
pub trait FeedClient: Send + Sync + 'static {
    async fn fetch (&self, bbox: &BoundingBox)->Result<StateBatch>;
}

/// result of one successful feed request
#[derive(Debug,Default,Clone)]
pub struct StateBatch {
    pub time: i64,                      // feed time of the response (epoch seconds)
    pub observations: Vec<Observation>,
    pub n_invalid: usize,               // records we had to drop (no position or identity)
}

/// query area in decimal degrees
#[derive(Debug,Clone,Copy,PartialEq)]
pub struct BoundingBox {
    pub lamin: f64,
    pub lomin: f64,
    pub lamax: f64,
    pub lomax: f64,
}

impl BoundingBox {
    /// `±tolerance` degrees around `center`. Latitudes are clamped to the poles
    pub fn around (center: &GeoPos, tolerance: f64)->Self {
        let tol = tolerance.abs();
        BoundingBox {
            lamin: (center.lat - tol).max(-90.0),
            lomin: center.lon - tol,
            lamax: (center.lat + tol).min(90.0),
            lomax: center.lon + tol,
        }
    }

    pub fn contains (&self, lon: f64, lat: f64)->bool {
        lat >= self.lamin && lat <= self.lamax && lon >= self.lomin && lon <= self.lomax
    }

    pub fn center (&self)->GeoPos {
        GeoPos::new( (self.lomin + self.lomax) / 2.0, (self.lamin + self.lamax) / 2.0, 0.0)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "lamin={}&lomin={}&lamax={}&lomax={}", self.lamin, self.lomin, self.lamax, self.lomax)
    }
}

/// feed statistics. These are updated by the tick task and can be read concurrently
#[derive(Debug,Default)]
pub struct FeedStats {
    queries: AtomicU64,
    failures: AtomicU64,
    invalid: AtomicU64,
    observations: AtomicU64,
}

impl FeedStats {
    pub fn new()->Self { FeedStats::default() }

    pub fn queries (&self)->u64 { self.queries.load(Ordering::Relaxed) }
    pub fn failures (&self)->u64 { self.failures.load(Ordering::Relaxed) }
    pub fn invalid (&self)->u64 { self.invalid.load(Ordering::Relaxed) }
    pub fn observations (&self)->u64 { self.observations.load(Ordering::Relaxed) }

    pub(crate) fn record_query (&self) { self.queries.fetch_add( 1, Ordering::Relaxed); }
    pub(crate) fn record_failure (&self) { self.failures.fetch_add( 1, Ordering::Relaxed); }
    pub(crate) fn record_batch (&self, batch: &StateBatch) {
        self.invalid.fetch_add( batch.n_invalid as u64, Ordering::Relaxed);
        self.observations.fetch_add( batch.observations.len() as u64, Ordering::Relaxed);
    }
}

impl fmt::Display for FeedStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "FeedStats( queries: {}, failures: {}, invalid: {}, observations: {})",
                self.queries(), self.failures(), self.invalid(), self.observations())
    }
}

/// retrieve the observations within `±tolerance` degrees around `center`.
/// Feed outages are not fatal - they are logged, counted and result in an empty list. A request that takes
/// longer than `max_wait` is treated as failed
pub async fn query_feed<F> (feed: &F, center: &GeoPos, tolerance: f64, max_wait: Duration, stats: &FeedStats)->Vec<Observation>
    where F: FeedClient + ?Sized
{
    let bbox = BoundingBox::around( center, tolerance);
    stats.record_query();

    let res = match tokio::time::timeout( max_wait, feed.fetch( &bbox)).await {
        Ok(res) => res,
        Err(_) => Err( feed_unavailable!("no response within {:?}", max_wait))
    };

    match res {
        Ok(batch) => {
            stats.record_batch( &batch);
            if batch.n_invalid > 0 {
                debug!("dropped {} state vectors without position", batch.n_invalid);
            }
            debug!("received {} observations for {}", batch.observations.len(), bbox);
            batch.observations
        }
        Err(e) => {
            stats.record_failure();
            warn!("feed query for {} failed: {}", bbox, e);
            Vec::new()
        }
    }
}
