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

//! constant velocity dead reckoning on the WGS84 ellipsoid
//!
//! Straight (bearing preserving) flight on an ellipsoid is not a planar vector add, hence we
//! project along the geodesic using the [geo](https://docs.rs/geo/latest/geo/index.html) `Geodesic` metric
//! space (Karney's algorithm). Vertical motion is applied independently and linearly.

use geo::{Destination, Geodesic, Point};

use crate::{Classification, GeoPos};

/// new position after moving `speed_mps * elapsed_secs` meters along bearing `heading_deg` from `pos`.
/// Negative elapsed time is treated as zero, i.e. we never move backwards
pub fn advance (pos: &GeoPos, speed_mps: f64, heading_deg: f64, vertical_rate_mps: f64, elapsed_secs: f64)->GeoPos {
    let dt = clamp_elapsed( elapsed_secs);
    if dt == 0.0 { return *pos }

    let alt = pos.alt + vertical_rate_mps * dt;
    let dist = speed_mps * dt;

    if dist > 0.0 && dist.is_finite() {
        let p = Geodesic.destination( Point::new( pos.lon, pos.lat), normalize_heading( heading_deg), dist);
        GeoPos::new( normalize_lon( p.x()), p.y(), alt)
    } else {
        GeoPos::new( pos.lon, pos.lat, alt)
    }
}

/// map any angle in degrees into [0,360)
#[inline]
pub fn normalize_heading (deg: f64)->f64 {
    let x = deg % 360.0;
    let x = if x < 0.0 { x + 360.0 } else { x };
    if x >= 360.0 { 0.0 } else { x } // -1e-15 % 360 + 360 rounds up to 360
}

/// map longitude degrees into [-180,180]
#[inline]
pub fn normalize_lon (deg: f64)->f64 {
    let x = deg % 360.0;
    if x < -180.0 { x + 360.0 } else if x > 180.0 { x - 360.0 } else { x }
}

/// the heading attribute we publish to a RenderSink.
/// Heavy aircraft symbols have their model origin reversed and hence get rotated by 180deg
pub fn render_heading (heading_deg: f64, classification: Classification)->f64 {
    match classification {
        Classification::Light => normalize_heading( heading_deg),
        Classification::Heavy => normalize_heading( heading_deg + 180.0),
    }
}

#[inline]
fn clamp_elapsed (elapsed_secs: f64)->f64 {
    if elapsed_secs > 0.0 { elapsed_secs } else { 0.0 } // this also catches NaN
}
