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

#![allow(unused)]

use geo::{Distance, Geodesic, Point};
use odin_airtrack::{mps, AircraftRegistry, Classification, GeoPos, Observation, RenderSink, UpsertOutcome};

// run with "cargo test --test test_registry -- --nocapture"

#[derive(Debug,Clone,PartialEq)]
enum Event {
    Create { id: usize, callsign: String, classification: Classification, heading: f64 },
    Update { id: usize, position: GeoPos, heading: Option<f64> },
    Remove { id: usize },
}

/// sink that records all notifications. Handles are sequence numbers
#[derive(Debug,Default)]
struct RecordingSink {
    next_id: usize,
    events: Vec<Event>,
}

impl RecordingSink {
    fn creates (&self)->usize { self.events.iter().filter( |e| matches!(e, Event::Create{..})).count() }
    fn removes (&self)->usize { self.events.iter().filter( |e| matches!(e, Event::Remove{..})).count() }
    fn updates_of (&self, handle: usize)->Vec<(GeoPos,Option<f64>)> {
        self.events.iter().filter_map( |e| match e {
            Event::Update{id,position,heading} if *id == handle => Some((*position,*heading)),
            _ => None
        }).collect()
    }
}

impl RenderSink for RecordingSink {
    type Handle = usize;

    fn on_create (&mut self, callsign: &str, position: &GeoPos, classification: Classification, heading: f64)->usize {
        self.next_id += 1;
        self.events.push( Event::Create { id: self.next_id, callsign: callsign.to_string(), classification, heading });
        self.next_id
    }

    fn on_update (&mut self, handle: &usize, position: &GeoPos, heading: Option<f64>) {
        self.events.push( Event::Update { id: *handle, position: *position, heading });
    }

    fn on_remove (&mut self, handle: usize) {
        self.events.push( Event::Remove { id: handle });
    }
}

const T: i64 = 1_700_000_000;

fn obs (callsign: &str, lon: f64, lat: f64, speed: f64, heading: f64, timestamp: i64)->Observation {
    Observation {
        icao24: "abcdef".to_string(),
        callsign: callsign.to_string(),
        position: GeoPos::new( lon, lat, 1000.0),
        ground_speed: mps( speed),
        heading,
        vertical_rate: mps( 0.0),
        timestamp
    }
}

fn distance (a: &GeoPos, b: &GeoPos)->f64 {
    Geodesic.distance( Point::new( a.lon, a.lat), Point::new( b.lon, b.lat))
}

#[test]
fn test_create_update_purge () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());

    // N1 shows up, stationary
    assert_eq!( reg.upsert( obs( "N1", -117.0, 33.0, 0.0, 0.0, T), T), UpsertOutcome::Created);
    assert_eq!( reg.len(), 1);
    assert_eq!( reg.sink().creates(), 1);

    let handle = reg.get("N1").unwrap().render_handle;
    assert_eq!( reg.get("N1").unwrap().classification, Classification::Light);

    // feed update for the same callsign re-uses the same handle
    assert_eq!( reg.upsert( obs( "N1", -117.001, 33.0, 0.0, 0.0, T+5), T+5), UpsertOutcome::Updated);
    assert_eq!( reg.len(), 1);
    assert_eq!( reg.sink().creates(), 1);
    assert_eq!( reg.get("N1").unwrap().render_handle, handle);
    assert_eq!( reg.get("N1").unwrap().last_observed_at, T+5);
    assert_eq!( reg.sink().updates_of( handle).len(), 1);

    // last observed at T+5: still there 29s later, gone 31s later
    assert_eq!( reg.purge_stale( T+5+29, 30), 0);
    assert_eq!( reg.purge_stale( T+5+30, 30), 0); // not strictly older
    assert!( reg.contains("N1"));

    assert_eq!( reg.purge_stale( T+5+31, 30), 1);
    assert!( reg.is_empty());
    assert_eq!( reg.dropped_list(), &["N1".to_string()]);
    assert_eq!( reg.sink().removes(), 1);
    assert!( matches!( reg.sink().events.last(), Some(Event::Remove{id}) if *id == handle));
}

#[test]
fn test_n1_scenario () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());

    let mut o = obs( "N1", 0.0, 0.0, 10.0, 0.0, T);
    o.position.alt = 0.0;
    reg.upsert( o, T);

    reg.extrapolate_all( 1.0);
    let p = reg.get("N1").unwrap().position;
    println!("N1 after 1s: {p}");
    assert!( p.lat > 0.0 && p.lon.abs() < 1e-12);
    assert!( (distance( &GeoPos::new( 0.0, 0.0, 0.0), &p) - 10.0).abs() < 1e-3);

    assert_eq!( reg.purge_stale( T+29, 30), 0);
    assert_eq!( reg.purge_stale( T+31, 30), 1);
    assert!( reg.is_empty());
}

#[test]
fn test_dead_reckoning () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());

    // 100 m/s east, observed just now
    reg.upsert( obs( "N2", -117.0, 33.0, 100.0, 90.0, T), T);
    let p0 = reg.get("N2").unwrap().position;
    assert_eq!( p0, GeoPos::new( -117.0, 33.0, 1000.0));

    reg.extrapolate_all( 10.0);
    let p1 = reg.get("N2").unwrap().position;
    println!("{p0} -> {p1}");

    assert!( p1.lon > p0.lon);
    assert!( (distance( &p0, &p1) - 1000.0).abs() < 0.01);
    assert_eq!( reg.get("N2").unwrap().last_observed_at, T); // extrapolation does not refresh

    let handle = reg.get("N2").unwrap().render_handle;
    let updates = reg.sink().updates_of( handle);
    assert_eq!( updates.len(), 1);
    assert_eq!( updates[0], (p1, Some(90.0))); // light aircraft publish their heading

    // zero or negative elapsed time does not move anything
    reg.extrapolate_all( 0.0);
    reg.extrapolate_all( -1.0);
    assert_eq!( reg.get("N2").unwrap().position, p1);
}

#[test]
fn test_old_observation_is_projected () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());

    // reported 10s ago at 100 m/s north, i.e. we should place it ~1000m further
    reg.upsert( obs( "N3", -117.0, 33.0, 100.0, 0.0, T-10), T);
    let ac = reg.get("N3").unwrap();
    println!("{ac}");

    assert_eq!( ac.last_observed_at, T-10);
    assert!( ac.position.lat > 33.0);
    assert!( (distance( &GeoPos::new( -117.0, 33.0, 0.0), &ac.position) - 1000.0).abs() < 0.01);

    // same for an eastbound aircraft
    reg.upsert( obs( "N4", -117.0, 33.0, 100.0, 90.0, T-10), T);
    let ac = reg.get("N4").unwrap();
    println!("{ac}");

    assert!( ac.position.lon > -117.0);
    assert!( (ac.position.lat - 33.0).abs() < 1e-3);
    assert!( (distance( &GeoPos::new( -117.0, 33.0, 0.0), &ac.position) - 1000.0).abs() < 0.01);
}

#[test]
fn test_purge_mixed_ages () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());

    reg.upsert( obs( "A", -117.0, 33.0, 0.0, 0.0, T-100), T);
    reg.upsert( obs( "B", -117.0, 33.0, 0.0, 0.0, T-31), T);
    reg.upsert( obs( "C", -117.0, 33.0, 0.0, 0.0, T-30), T);
    reg.upsert( obs( "D", -117.0, 33.0, 0.0, 0.0, T), T);
    let handles: Vec<usize> = ["A","B"].iter().map( |cs| reg.get(cs).unwrap().render_handle).collect();

    assert_eq!( reg.purge_stale( T, 30), 2);
    let left: Vec<String> = reg.snapshot().into_iter().map( |ac| ac.callsign).collect();
    assert_eq!( left, vec!["C".to_string(), "D".to_string()]);

    let mut dropped = reg.dropped_list().to_vec();
    dropped.sort();
    assert_eq!( dropped, vec!["A".to_string(), "B".to_string()]);

    // exactly one removal per purged aircraft
    for h in &handles {
        let n = reg.sink().events.iter().filter( |e| matches!(e, Event::Remove{id} if id == h)).count();
        assert_eq!( n, 1);
    }
    assert_eq!( reg.sink().removes(), 2);

    assert_eq!( reg.purge_stale( T, 30), 0);
    assert_eq!( reg.sink().removes(), 2);
    assert!( reg.dropped_list().is_empty());
}

#[test]
fn test_unknown_timestamp () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());

    reg.upsert( obs( "N4", -117.0, 33.0, 100.0, 0.0, 0), T);
    let ac = reg.get("N4").unwrap();
    assert_eq!( ac.last_observed_at, T);
    assert_eq!( ac.position, GeoPos::new( -117.0, 33.0, 1000.0));
}

#[test]
fn test_outdated () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());

    reg.upsert( obs( "N5", -117.0, 33.0, 0.0, 0.0, T), T);
    assert_eq!( reg.upsert( obs( "N5", -118.0, 34.0, 0.0, 0.0, T-20), T), UpsertOutcome::Outdated);

    let ac = reg.get("N5").unwrap();
    assert_eq!( ac.position.lon, -117.0);
    assert_eq!( ac.last_observed_at, T);
    assert_eq!( reg.sink().events.len(), 1); // only the create
}

#[test]
fn test_classification () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());

    reg.upsert( obs( "N12345", -117.0, 33.0, 50.0, 90.0, T), T);
    reg.upsert( obs( "BAW123", -117.1, 33.1, 200.0, 90.0, T), T);

    assert_eq!( reg.get("N12345").unwrap().classification, Classification::Light);
    assert_eq!( reg.get("BAW123").unwrap().classification, Classification::Heavy);

    let creates: Vec<(String,Classification,f64)> = reg.sink().events.iter().filter_map( |e| match e {
        Event::Create{callsign,classification,heading,..} => Some((callsign.clone(),*classification,*heading)),
        _ => None
    }).collect();
    assert_eq!( creates, vec![
        ("N12345".to_string(), Classification::Light, 90.0),
        ("BAW123".to_string(), Classification::Heavy, 270.0), // heavy symbols are reversed
    ]);
}

#[test]
fn test_heavy_heading () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());

    reg.upsert( obs( "BAW123", -117.0, 33.0, 200.0, 90.0, T), T);
    let handle = reg.get("BAW123").unwrap().render_handle;

    reg.extrapolate_all( 1.0);
    assert_eq!( reg.sink().updates_of( handle)[0].1, None); // heavies keep their heading between feed updates

    reg.upsert( obs( "BAW123", -116.99, 33.0, 200.0, 100.0, T+10), T+10);
    let updates = reg.sink().updates_of( handle);
    assert_eq!( updates.last().unwrap().1, Some(280.0));
    assert_eq!( reg.get("BAW123").unwrap().heading, 100.0); // stored heading is the true track
}

#[test]
fn test_custom_classifier () {
    let classifier = |cs: &str| if cs.len() > 5 { Classification::Heavy } else { Classification::Light };
    let mut reg = AircraftRegistry::with_classifier( RecordingSink::default(), Box::new( classifier));

    reg.upsert( obs( "N123456", -117.0, 33.0, 0.0, 0.0, T), T);
    reg.upsert( obs( "UAL1", -117.0, 33.0, 0.0, 0.0, T), T);
    assert_eq!( reg.get("N123456").unwrap().classification, Classification::Heavy);
    assert_eq!( reg.get("UAL1").unwrap().classification, Classification::Light);
}

#[test]
fn test_snapshot_and_clear () {
    let mut reg = AircraftRegistry::new( RecordingSink::default());
    for cs in ["SWA9", "N77", "AAL1"] {
        reg.upsert( obs( cs, -117.0, 33.0, 10.0, 0.0, T), T);
    }

    let snapshot = reg.snapshot();
    let callsigns: Vec<&str> = snapshot.iter().map( |ac| ac.callsign.as_str()).collect();
    assert_eq!( callsigns, vec!["AAL1", "N77", "SWA9"]);

    reg.extrapolate_all( 5.0);
    assert_eq!( snapshot[0].position, GeoPos::new( -117.0, 33.0, 1000.0)); // snapshots are copies

    assert_eq!( reg.clear(), 3);
    assert!( reg.is_empty());
    assert_eq!( reg.sink().removes(), 3);
}
