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

use std::collections::HashMap;
use tracing::debug;
use uom::si::velocity::meter_per_second;

use crate::{Classification, Observation, TrackedAircraft};
use crate::classify::{Classifier, TailNumberClassifier};
use crate::motion::{advance, normalize_heading, render_heading};
use crate::sink::RenderSink;

/// what `upsert` did with an observation
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Outdated, // older than what we already have - ignored
}

/// the set of currently visible aircraft, keyed by callsign.
/// The registry owns the only mutable aircraft state and keeps it 1:1 with the handles of its RenderSink.
/// It is not synchronized - the tick task is the single writer and readers get [`snapshot`](Self::snapshot) copies
pub struct AircraftRegistry<S: RenderSink> {
    aircraft: HashMap<String,TrackedAircraft<S::Handle>>,
    sink: S,
    classifier: Box<dyn Classifier>,
    dropped_list: Vec<String>, // callsigns removed by the last purge (reused to avoid allocation)
}

impl<S: RenderSink> AircraftRegistry<S> {
    pub fn new (sink: S)->Self {
        AircraftRegistry::with_classifier( sink, Box::new( TailNumberClassifier))
    }

    pub fn with_classifier (sink: S, classifier: Box<dyn Classifier>)->Self {
        AircraftRegistry { aircraft: HashMap::new(), sink, classifier, dropped_list: Vec::new() }
    }

    pub fn len (&self)->usize { self.aircraft.len() }
    pub fn is_empty (&self)->bool { self.aircraft.is_empty() }

    pub fn get (&self, callsign: &str)->Option<&TrackedAircraft<S::Handle>> { self.aircraft.get( callsign) }
    pub fn contains (&self, callsign: &str)->bool { self.aircraft.contains_key( callsign) }

    pub fn sink (&self)->&S { &self.sink }

    /// callsigns removed by the last `purge_stale`
    pub fn dropped_list (&self)->&[String] { self.dropped_list.as_slice() }

    /// merge a feed observation. The reported position is dead reckoned from the observation time to `now_unix`
    /// so that a record which is already N seconds old is not shown N seconds behind
    pub fn upsert (&mut self, obs: Observation, now_unix: i64)->UpsertOutcome {
        let observed_at = if obs.timestamp > 0 { obs.timestamp } else { now_unix }; // 0: feed did not tell us
        let heading = normalize_heading( obs.heading);
        let speed_mps = obs.ground_speed.get::<meter_per_second>();
        let vrate_mps = obs.vertical_rate.get::<meter_per_second>();

        if let Some(ac) = self.aircraft.get_mut( obs.callsign.as_str()) {
            if observed_at < ac.last_observed_at {
                return UpsertOutcome::Outdated
            }

            ac.position = advance( &obs.position, speed_mps, heading, vrate_mps, (now_unix - observed_at) as f64);
            ac.ground_speed = obs.ground_speed;
            ac.heading = heading;
            ac.vertical_rate = obs.vertical_rate;
            ac.last_observed_at = observed_at;

            self.sink.on_update( &ac.render_handle, &ac.position, Some( render_heading( heading, ac.classification)));
            UpsertOutcome::Updated

        } else {
            let classification = self.classifier.classify( obs.callsign.as_str());
            let position = advance( &obs.position, speed_mps, heading, vrate_mps, (now_unix - observed_at) as f64);
            let render_handle = self.sink.on_create( obs.callsign.as_str(), &position, classification, render_heading( heading, classification));

            debug!("tracking {} as {:?}", obs.callsign, classification);
            let ac = TrackedAircraft {
                callsign: obs.callsign.clone(),
                position,
                ground_speed: obs.ground_speed,
                heading,
                vertical_rate: obs.vertical_rate,
                last_observed_at: observed_at,
                classification,
                render_handle,
            };
            self.aircraft.insert( obs.callsign, ac);
            UpsertOutcome::Created
        }
    }

    /// move all aircraft along their current kinematic state.
    /// Note that only Light aircraft republish their heading. Heavy aircraft keep the (reversed) heading
    /// attribute they got at their last feed update
    pub fn extrapolate_all (&mut self, elapsed_secs: f64) {
        if !(elapsed_secs > 0.0) { return }

        for ac in self.aircraft.values_mut() {
            ac.position = advance( &ac.position, ac.ground_speed_mps(), ac.heading, ac.vertical_rate_mps(), elapsed_secs);

            let heading = match ac.classification {
                Classification::Light => Some( ac.render_heading()),
                Classification::Heavy => None,
            };
            self.sink.on_update( &ac.render_handle, &ac.position, heading);
        }
    }

    /// remove all aircraft whose last observation is more than `threshold_secs` old. Entries that are exactly
    /// at the threshold are kept. Returns the number of removed aircraft
    pub fn purge_stale (&mut self, now_unix: i64, threshold_secs: i64)->usize {
        self.dropped_list.clear();
        for ac in self.aircraft.values() {
            if ac.age( now_unix) > threshold_secs {
                self.dropped_list.push( ac.callsign.clone());
            }
        }

        for callsign in &self.dropped_list {
            if let Some(ac) = self.aircraft.remove( callsign.as_str()) {
                debug!("dropping stale {} (last observed {}s ago)", callsign, ac.age( now_unix));
                self.sink.on_remove( ac.render_handle);
            }
        }

        self.dropped_list.len()
    }

    /// point-in-time copy of all tracked aircraft, ordered by callsign
    pub fn snapshot (&self)->Vec<TrackedAircraft<S::Handle>> {
        let mut list: Vec<TrackedAircraft<S::Handle>> = self.aircraft.values().cloned().collect();
        list.sort_by( |a,b| a.callsign.cmp( &b.callsign));
        list
    }

    /// release all render handles, e.g. when the engine shuts down
    pub fn clear (&mut self)->usize {
        let n = self.aircraft.len();
        for (_,ac) in self.aircraft.drain() {
            self.sink.on_remove( ac.render_handle);
        }
        n
    }
}
