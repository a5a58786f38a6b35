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

use std::{fmt, sync::Arc};
use chrono::Utc;
use tokio::{sync::watch, task::JoinHandle, time::{self, Instant, MissedTickBehavior}};
use tokio_util::sync::CancellationToken;
use tracing::{debug,info};

use crate::{AirtrackConfig, GeoPos, TrackedAircraft};
use crate::errors::{op_failed, Result};
use crate::feed::{query_feed, FeedClient, FeedStats};
use crate::registry::{AircraftRegistry, UpsertOutcome};
use crate::sink::RenderSink;

/// immutable, point-in-time view of the registry that is published after each tick
pub type Snapshot<H> = Arc<Vec<TrackedAircraft<H>>>;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum EngineState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineState::Idle => write!(f, "idle"),
            EngineState::Running => write!(f, "running"),
            EngineState::Stopped => write!(f, "stopped"),
        }
    }
}

/// what a single tick did
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum TickPhase {
    Cleanup,
    Query,
    Extrapolate,
}

/* #region schedule ***************************************************************************************/

#[derive(Debug,Clone)]
struct Countdown {
    period: u64,
    remaining: u64,
}

impl Countdown {
    fn new (period: u64, first_due: u64)->Self {
        Countdown { period: period.max(1), remaining: first_due.max(1) }
    }

    fn advance (&mut self)->bool {
        if self.remaining <= 1 {
            self.remaining = self.period;
            true
        } else {
            self.remaining -= 1;
            false
        }
    }
}

/// phase table for the tick driver.
/// Cleanup and query run on their own countdowns (in ticks). If both are due on the same tick cleanup goes first
/// and the query is deferred to the next tick. A query that was already deferred once is not deferred again, i.e.
/// cleanup cannot starve queries. All other ticks extrapolate. The first query is due on the first tick so that
/// we don't start with an empty sky
#[derive(Debug,Clone)]
pub struct TickSchedule {
    tick: u64,
    cleanup: Countdown,
    query: Countdown,
    query_deferred: bool,
    cleanup_deferred: bool,
}

impl TickSchedule {
    pub fn new (cleanup_ticks: u64, query_ticks: u64)->Self {
        TickSchedule {
            tick: 0,
            cleanup: Countdown::new( cleanup_ticks, cleanup_ticks),
            query: Countdown::new( query_ticks, 1),
            query_deferred: false,
            cleanup_deferred: false,
        }
    }

    pub fn from_config (config: &AirtrackConfig)->Self {
        TickSchedule::new( config.ticks_per( config.cleanup_interval), config.ticks_per( config.query_interval))
    }

    /// number of ticks so far
    pub fn tick_count (&self)->u64 { self.tick }

    pub fn next_phase (&mut self)->TickPhase {
        self.tick += 1;

        let cleanup_due = self.cleanup.advance() || self.cleanup_deferred;
        let query_due = self.query.advance() || self.query_deferred;

        if cleanup_due && query_due {
            if self.query_deferred { // query already waited a tick, now it's cleanup's turn to wait
                self.query_deferred = false;
                self.cleanup_deferred = true;
                TickPhase::Query
            } else {
                self.query_deferred = true;
                self.cleanup_deferred = false;
                TickPhase::Cleanup
            }
        } else if cleanup_due {
            self.cleanup_deferred = false;
            TickPhase::Cleanup
        } else if query_due {
            self.query_deferred = false;
            TickPhase::Query
        } else {
            TickPhase::Extrapolate
        }
    }
}

/* #endregion schedule */

/// cloneable setter for the query center. Can be used from any thread
#[derive(Debug,Clone)]
pub struct CenterSetter(Arc<watch::Sender<GeoPos>>);

impl CenterSetter {
    pub fn set (&self, center: GeoPos) { self.0.send_replace( center); }
    pub fn get (&self)->GeoPos { *self.0.borrow() }
}

/// the fixed rate driver that keeps the registry in sync with the feed.
///
/// Each tick either purges stale aircraft, queries the feed and merges the results, or extrapolates all
/// aircraft positions (see [`TickSchedule`]). Ticks can be executed explicitly through [`tick`](Self::tick)
/// or by a spawned tick task through [`start`](Self::start)
pub struct TrackingEngine<F,S> where F: FeedClient, S: RenderSink {
    config: Arc<AirtrackConfig>,
    feed: F,
    registry: AircraftRegistry<S>,
    schedule: TickSchedule,

    center_tx: Arc<watch::Sender<GeoPos>>,
    center_rx: watch::Receiver<GeoPos>,
    snapshot_tx: watch::Sender<Snapshot<S::Handle>>,
    state_tx: watch::Sender<EngineState>,
    stats: Arc<FeedStats>,

    last_motion: Instant, // when positions were last extrapolated
}

impl<F,S> TrackingEngine<F,S> where F: FeedClient, S: RenderSink {

    pub fn new (config: AirtrackConfig, feed: F, sink: S)->Result<Self> {
        TrackingEngine::with_registry( config, feed, AircraftRegistry::new( sink))
    }

    pub fn with_registry (config: AirtrackConfig, feed: F, registry: AircraftRegistry<S>)->Result<Self> {
        config.validate()?;

        let schedule = TickSchedule::from_config( &config);
        let (center_tx, center_rx) = watch::channel( config.default_center);
        let (snapshot_tx, _) = watch::channel( Arc::new( Vec::new()));
        let (state_tx, _) = watch::channel( EngineState::Idle);

        Ok( TrackingEngine {
            config: Arc::new(config),
            feed,
            registry,
            schedule,
            center_tx: Arc::new(center_tx),
            center_rx,
            snapshot_tx,
            state_tx,
            stats: Arc::new( FeedStats::new()),
            last_motion: Instant::now(),
        })
    }

    pub fn config (&self)->&AirtrackConfig { &self.config }
    pub fn registry (&self)->&AircraftRegistry<S> { &self.registry }
    pub fn stats (&self)->Arc<FeedStats> { self.stats.clone() }
    pub fn state (&self)->EngineState { *self.state_tx.borrow() }
    pub fn tick_count (&self)->u64 { self.schedule.tick_count() }

    /// set the center for the next query. The whole position is published at once
    pub fn set_center (&self, center: GeoPos) { self.center_tx.send_replace( center); }
    pub fn center (&self)->GeoPos { *self.center_rx.borrow() }
    pub fn center_setter (&self)->CenterSetter { CenterSetter( self.center_tx.clone()) }

    /// receiver for the snapshots published after each tick
    pub fn subscribe (&self)->watch::Receiver<Snapshot<S::Handle>> { self.snapshot_tx.subscribe() }

    /// execute one tick. Ticks have to be executed sequentially, which is enforced by `&mut self`
    pub async fn tick (&mut self)->TickPhase {
        let phase = self.schedule.next_phase();
        match phase {
            TickPhase::Cleanup => { self.purge(); }
            TickPhase::Query => { self.refresh().await; }
            TickPhase::Extrapolate => { self.extrapolate(); }
        }
        self.publish_snapshot();
        phase
    }

    /// drop aircraft we have not heard about for more than `drop_after`
    pub fn purge (&mut self)->usize {
        let n = self.registry.purge_stale( utc_now_secs(), self.config.drop_after_secs());
        if n > 0 {
            debug!("purged {} stale aircraft, {} remaining", n, self.registry.len());
        }
        n
    }

    /// query the feed around the current center and merge the results. Returns number of merged observations
    pub async fn refresh (&mut self)->usize {
        let center = *self.center_rx.borrow_and_update();
        let config = self.config.clone();
        let observations = query_feed( &self.feed, &center, config.tolerance, config.query_timeout, &self.stats).await;

        // nothing below awaits, i.e. a cancelled refresh never leaves a partially merged batch behind
        self.extrapolate(); // catch up for the time we waited for the response
        let now = utc_now_secs();
        let mut n_merged = 0;
        for obs in observations {
            if self.registry.upsert( obs, now) != UpsertOutcome::Outdated {
                n_merged += 1;
            }
        }
        n_merged
    }

    /// advance all aircraft by the time that has passed since the last extrapolation
    pub fn extrapolate (&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since( self.last_motion).as_secs_f64();
        self.last_motion = now;
        self.registry.extrapolate_all( elapsed);
    }

    /// remove all aircraft and release their render handles
    pub fn release_all (&mut self)->usize {
        let n = self.registry.clear();
        self.publish_snapshot();
        n
    }

    fn publish_snapshot (&mut self) {
        if self.snapshot_tx.receiver_count() > 0 {
            self.snapshot_tx.send_replace( Arc::new( self.registry.snapshot()));
        }
    }

    /// spawn the tick task and transition from `Idle` to `Running`. This needs to be called from within a tokio runtime
    pub fn start (self)->Result<EngineHandle<F,S>> {
        let state = self.state();
        if state != EngineState::Idle {
            return Err( op_failed!("cannot start engine in state {state}"))
        }

        let cancel = CancellationToken::new();
        let handle_cancel = cancel.clone();
        let center_tx = self.center_tx.clone();
        let snapshot_rx = self.snapshot_tx.subscribe();
        let state_rx = self.state_tx.subscribe();
        let stats = self.stats.clone();

        self.state_tx.send_replace( EngineState::Running);
        let task = tokio::spawn( self.run( cancel));

        Ok( EngineHandle { center: CenterSetter(center_tx), snapshot_rx, state_rx, stats, cancel: handle_cancel, task } )
    }

    async fn run (mut self, cancel: CancellationToken)->Self {
        let mut interval = time::interval( self.config.tick_interval());
        interval.set_missed_tick_behavior( MissedTickBehavior::Delay); // a late tick is deferred, never run concurrently
        self.last_motion = Instant::now();
        info!("tracking engine running at {} Hz", self.config.tick_rate);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break, // abandons an in-flight query
                _ = self.tick() => {}
            }
        }

        self.state_tx.send_replace( EngineState::Stopped);
        info!("tracking engine stopped after {} ticks, {}", self.schedule.tick_count(), self.stats);
        self
    }
}

/// the control interface of a running [`TrackingEngine`]
pub struct EngineHandle<F,S> where F: FeedClient, S: RenderSink {
    center: CenterSetter,
    snapshot_rx: watch::Receiver<Snapshot<S::Handle>>,
    state_rx: watch::Receiver<EngineState>,
    stats: Arc<FeedStats>,
    cancel: CancellationToken,
    task: JoinHandle<TrackingEngine<F,S>>,
}

impl<F,S> EngineHandle<F,S> where F: FeedClient, S: RenderSink {
    pub fn set_center (&self, center: GeoPos) { self.center.set( center) }
    pub fn center_setter (&self)->CenterSetter { self.center.clone() }

    pub fn snapshot (&self)->Snapshot<S::Handle> { self.snapshot_rx.borrow().clone() }
    pub fn subscribe (&self)->watch::Receiver<Snapshot<S::Handle>> { self.snapshot_rx.clone() }

    pub fn state (&self)->EngineState { *self.state_rx.borrow() }
    pub fn stats (&self)->Arc<FeedStats> { self.stats.clone() }

    /// cancel the tick task and wait for it to terminate. Returns the stopped engine so that the
    /// caller can inspect (or release) what was tracked
    pub async fn stop (self)->Result<TrackingEngine<F,S>> {
        self.cancel.cancel();
        self.task.await.map_err( |e| op_failed!("tick task failed: {e}"))
    }
}

fn utc_now_secs ()->i64 { Utc::now().timestamp() }
