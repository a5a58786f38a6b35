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

use std::{fs, path::Path, time::Duration};
use serde::{Serialize,Deserialize,Serializer,Deserializer};

use crate::GeoPos;
use crate::errors::{config_error, Result};

pub const OPENSKY_STATES_URL: &str = "https://opensky-network.org/api/states/all";

/// Redlands, CA - used until somebody calls `set_center`
pub const DEFAULT_CENTER: GeoPos = GeoPos { lon: -117.18, lat: 33.5556, alt: 0.0 };

/// tracking engine configuration, normally read from a RON file such as
/// ```ron
/// AirtrackConfig(
///     tick_rate: 30,
///     query_interval: "10s",
///     cleanup_interval: "30s",
///     tolerance: 0.5,
///     default_center: (lon: -117.18, lat: 33.5556),
/// )
/// ```
/// All fields are optional
#[derive(Deserialize,Serialize,Debug,Clone)]
#[serde(default)]
pub struct AirtrackConfig {
    pub url: String, // state vector endpoint

    pub tick_rate: u32, // ticks per second

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub cleanup_interval: Duration, // how often we purge stale aircraft

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub query_interval: Duration, // how often we ask the feed

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub drop_after: Duration, // max age of last observation before an aircraft gets purged

    #[serde(deserialize_with="deserialize_duration", serialize_with="serialize_duration")]
    pub query_timeout: Duration, // upper bound for one feed request

    pub tolerance: f64, // half width of query bounding box in degrees

    pub default_center: GeoPos,
}

impl Default for AirtrackConfig {
    fn default()->Self {
        AirtrackConfig {
            url: OPENSKY_STATES_URL.to_string(),
            tick_rate: 30,
            cleanup_interval: Duration::from_secs(30),
            query_interval: Duration::from_secs(10),
            drop_after: Duration::from_secs(30),
            query_timeout: Duration::from_secs(5),
            tolerance: 0.5,
            default_center: DEFAULT_CENTER,
        }
    }
}

impl AirtrackConfig {
    pub fn validate (&self)->Result<()> {
        if self.tick_rate == 0 { return Err( config_error!("tick_rate has to be > 0")) }
        if self.cleanup_interval.is_zero() { return Err( config_error!("cleanup_interval has to be > 0")) }
        if self.ticks_per( self.cleanup_interval) < 2 {
            return Err( config_error!("cleanup_interval {:?} leaves no ticks for query or extrapolation", self.cleanup_interval))
        }
        if self.query_interval.is_zero() { return Err( config_error!("query_interval has to be > 0")) }
        if self.query_timeout.is_zero() { return Err( config_error!("query_timeout has to be > 0")) }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err( config_error!("tolerance has to be a positive number of degrees: {}", self.tolerance))
        }
        if !(self.default_center.lat.abs() <= 90.0 && self.default_center.lon.abs() <= 180.0) {
            return Err( config_error!("default_center out of range: {}", self.default_center))
        }
        Ok(())
    }

    pub fn tick_interval (&self)->Duration { Duration::from_secs_f64( 1.0 / self.tick_rate as f64) }

    /// number of ticks that make up `interval` (at least one)
    pub fn ticks_per (&self, interval: Duration)->u64 {
        let n = (interval.as_secs_f64() * self.tick_rate as f64).round() as u64;
        n.max(1)
    }

    pub fn drop_after_secs (&self)->i64 { self.drop_after.as_secs() as i64 }
}

pub fn load_config<P: AsRef<Path>> (path: P)->Result<AirtrackConfig> {
    let input = fs::read_to_string( path.as_ref())?;
    let config: AirtrackConfig = ron::from_str( &input)?;
    config.validate()?;
    Ok(config)
}

fn deserialize_duration<'a,D> (deserializer: D)->std::result::Result<Duration,D::Error> where D: Deserializer<'a> {
    String::deserialize(deserializer).and_then( |s| {
        parse_duration::parse( s.as_str()).map_err( |e| serde::de::Error::custom( format!("{:?}", e)))
    })
}

fn serialize_duration<S: Serializer> (dur: &Duration, s: S)->std::result::Result<S::Ok,S::Error> {
    s.serialize_str( &format!("{}ms", dur.as_millis()))
}
