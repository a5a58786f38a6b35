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

//! OpenSky Network REST client for `/states/all` bounding box queries
//!
//! see <https://openskynetwork.github.io/opensky-api/rest.html#all-state-vectors>. The response is
//! `{"time": <epoch-secs>, "states": [[..],..]}` where each state vector is a positional array, so
//! we have to decode by index and not by name

use std::time::Duration;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::{ACCEPT, HeaderValue}};
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::{AirtrackConfig, GeoPos, Observation, mps};
use crate::feed::{BoundingBox, FeedClient, StateBatch};
use crate::errors::{feed_unavailable, invalid_observation, parse_error, Result};

// state vector field indices
pub const ICAO24: usize = 0;
pub const CALLSIGN: usize = 1;
pub const TIME_POSITION: usize = 3;
pub const LAST_CONTACT: usize = 4;
pub const LONGITUDE: usize = 5;
pub const LATITUDE: usize = 6;
pub const BARO_ALTITUDE: usize = 7;
pub const VELOCITY: usize = 9;
pub const TRUE_TRACK: usize = 10;
pub const VERTICAL_RATE: usize = 11;
pub const GEO_ALTITUDE: usize = 13;

#[derive(Deserialize,Debug)]
struct StatesResponse {
    #[serde(default)]
    time: i64,
    states: Option<Vec<Value>>, // OpenSky sends `null` if there is nothing in the box
}

/// http based FeedClient for the OpenSky Network
pub struct OpenSkyClient {
    client: Client,
    url: String,
}

impl OpenSkyClient {
    pub fn new (url: impl Into<String>, timeout: Duration)->Result<Self> {
        let client = Client::builder()
            .timeout( timeout)
            .build()?;
        Ok( OpenSkyClient { client, url: url.into() } )
    }

    pub fn from_config (config: &AirtrackConfig)->Result<Self> {
        OpenSkyClient::new( config.url.as_str(), config.query_timeout)
    }

    pub fn query_url (&self, bbox: &BoundingBox)->String {
        format!("{}?{}", self.url, bbox)
    }
}

#[async_trait]
impl FeedClient for OpenSkyClient {
    async fn fetch (&self, bbox: &BoundingBox)->Result<StateBatch> {
        let url = self.query_url( bbox);
        let response = self.client.get( url.as_str())
            .header( ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                parse_states( &body)
            }
            other => Err( feed_unavailable!("response status {other:?} for {url}"))
        }
    }
}

/// decode a complete `/states/all` response.
/// Only a malformed document is an error - individual records without position are dropped and counted
pub fn parse_states (input: &str)->Result<StateBatch> {
    let response: StatesResponse = serde_json::from_str( input)?;
    let mut batch = StateBatch { time: response.time, observations: Vec::new(), n_invalid: 0 };

    if let Some(states) = response.states {
        batch.observations.reserve( states.len());
        for rec in &states {
            match parse_state_vector( rec) {
                Ok(obs) => batch.observations.push( obs),
                Err(e) => {
                    trace!("{e}");
                    batch.n_invalid += 1;
                }
            }
        }
    }

    Ok(batch)
}

/// decode a single positional state vector record
pub fn parse_state_vector (rec: &Value)->Result<Observation> {
    let fields = rec.as_array().ok_or_else( || parse_error!("state vector is not an array: {rec}"))?;

    let icao24 = str_field( fields, ICAO24).map( |s| s.trim().to_string()).unwrap_or_default();
    let callsign = match str_field( fields, CALLSIGN).map( clean_callsign) {
        Some(cs) if !cs.is_empty() => cs,
        _ if !icao24.is_empty() => icao24.to_uppercase(),
        _ => return Err( invalid_observation!("state vector without callsign or icao24: {rec}"))
    };

    let (lon, lat) = match (f64_field( fields, LONGITUDE), f64_field( fields, LATITUDE)) {
        (Some(lon), Some(lat)) => (lon, lat),
        _ => return Err( invalid_observation!("no position for {callsign}"))
    };

    let alt = f64_field( fields, GEO_ALTITUDE).or_else( || f64_field( fields, BARO_ALTITUDE)).unwrap_or(0.0);
    let ground_speed = mps( f64_field( fields, VELOCITY).unwrap_or(0.0));
    let heading = f64_field( fields, TRUE_TRACK).unwrap_or(0.0);
    let vertical_rate = mps( f64_field( fields, VERTICAL_RATE).unwrap_or(0.0));
    let timestamp = i64_field( fields, TIME_POSITION).or_else( || i64_field( fields, LAST_CONTACT)).unwrap_or(0);

    let position = GeoPos::new( lon, lat, alt);
    Ok( Observation { icao24, callsign, position, ground_speed, heading, vertical_rate, timestamp } )
}

/// strip the blank padding OpenSky uses for its 8 char callsigns (and stray quotes)
pub fn clean_callsign (s: &str)->String {
    s.trim().trim_matches('"').trim().to_string()
}

// a field is "missing" if it is either absent, JSON null or of the wrong type

fn str_field<'a> (fields: &'a [Value], idx: usize)->Option<&'a str> {
    fields.get(idx).and_then( |v| v.as_str())
}

fn f64_field (fields: &[Value], idx: usize)->Option<f64> {
    fields.get(idx).and_then( |v| v.as_f64()).filter( |v| v.is_finite())
}

fn i64_field (fields: &[Value], idx: usize)->Option<i64> {
    fields.get(idx).and_then( |v| v.as_i64().or_else( || v.as_f64().map( |x| x as i64)))
}
