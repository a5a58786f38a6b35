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

//! live aircraft tracking with geodesic dead reckoning
//!
//! This crate periodically retrieves aircraft state vectors for a bounding box around a (movable) center
//! point, keeps a registry of visible aircraft and in between feed updates extrapolates their positions
//! at a fixed tick rate so that a renderer can show continuous motion. Rendering itself is abstracted
//! by the [`sink::RenderSink`] trait, the feed by [`feed::FeedClient`].

use std::fmt;
use serde::{Serialize,Deserialize};
use uom::si::{f64::Velocity, velocity::{knot,foot_per_second,meter_per_second}};

pub mod errors;

pub mod config;
pub use config::{AirtrackConfig, load_config};

pub mod motion;

pub mod classify;
pub use classify::{Classifier, TailNumberClassifier};

pub mod feed;
pub use feed::{BoundingBox, FeedClient, FeedStats, StateBatch, query_feed};

pub mod opensky;
pub use opensky::OpenSkyClient;

pub mod sink;
pub use sink::{RenderSink, LogSink};

pub mod registry;
pub use registry::{AircraftRegistry, UpsertOutcome};

pub mod engine;
pub use engine::{CenterSetter, EngineHandle, EngineState, Snapshot, TickPhase, TickSchedule, TrackingEngine};

/// geodetic position: longitude and latitude in degrees, altitude in meters
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq)]
pub struct GeoPos {
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub alt: f64,
}

impl GeoPos {
    pub fn new (lon: f64, lat: f64, alt: f64)->Self { GeoPos { lon, lat, alt } }
}

impl fmt::Display for GeoPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "[{:.5},{:.5},{:.0}m]", self.lon, self.lat, self.alt)
    }
}

/// coarse aircraft category that selects the render symbol and heading semantics
#[derive(Serialize,Deserialize,Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum Classification {
    Light,
    Heavy,
}

/// one decoded state vector as reported by the feed. These are consumed once by the registry
#[derive(Debug,Clone,PartialEq)]
pub struct Observation {
    pub icao24: String,
    pub callsign: String,
    pub position: GeoPos,   // as reported, i.e. at `timestamp`
    pub ground_speed: Velocity,
    pub heading: f64,       // degrees, true track
    pub vertical_rate: Velocity,
    pub timestamp: i64,     // epoch seconds of the reported position, 0 if unknown
}

/// the data model for a tracked aircraft
/// `H` is whatever the RenderSink returned for this aircraft. We only keep it so that we can release it
#[derive(Serialize,Debug,Clone)]
pub struct TrackedAircraft<H> {
    pub callsign: String,
    pub position: GeoPos,
    pub ground_speed: Velocity,
    pub heading: f64,
    pub vertical_rate: Velocity,
    pub last_observed_at: i64, // only set from feed observations, never by extrapolation
    pub classification: Classification,

    #[serde(skip)]
    pub render_handle: H,
}

impl<H> TrackedAircraft<H> {
    pub fn ground_speed_mps (&self)->f64 { self.ground_speed.get::<meter_per_second>() }
    pub fn vertical_rate_mps (&self)->f64 { self.vertical_rate.get::<meter_per_second>() }

    /// the heading we hand to the RenderSink (see [`motion::render_heading`])
    pub fn render_heading (&self)->f64 { motion::render_heading( self.heading, self.classification) }

    pub fn age (&self, now_unix: i64)->i64 { now_unix - self.last_observed_at }
}

impl<H> fmt::Display for TrackedAircraft<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!( f, "TrackedAircraft( cs: \"{}\", {:?}, pos: {}", self.callsign, self.classification, self.position)?;
        write!( f, ", spd: {:.1}kn", self.ground_speed.get::<knot>())?;
        write!( f, ", hdg: {:.0}", self.heading)?;
        write!( f, ", vr: {:.1}ft/s", self.vertical_rate.get::<foot_per_second>())?;
        write!( f, ", observed: {})", self.last_observed_at)
    }
}

/// shorthand for the m/s based velocities the feed reports
#[inline]
pub fn mps (v: f64)->Velocity { Velocity::new::<meter_per_second>(v) }
