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

use std::time::Duration;
use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{info,warn};
use tracing_subscriber::EnvFilter;
use odin_airtrack::{load_config, AirtrackConfig, GeoPos, LogSink, OpenSkyClient, TrackingEngine};

#[derive(Parser,Debug)]
#[command(about="headless live aircraft tracker (set RUST_LOG=debug to see registry notifications)")]
struct Args {
    /// RON config file (defaults are used if not set)
    #[arg(long)]
    config: Option<String>,

    /// longitude of query center
    #[arg(long, allow_hyphen_values=true)]
    lon: Option<f64>,

    /// latitude of query center
    #[arg(long, allow_hyphen_values=true)]
    lat: Option<f64>,

    /// run for the given duration (e.g. "2min") instead of waiting for ctrl-c
    #[arg(long)]
    run_for: Option<String>,

    /// interval for printing the tracked aircraft
    #[arg(long, default_value="5s")]
    report: String,
}

#[tokio::main]
async fn main()->Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::from_default_env()) // use RUST_LOG to set max level
        .try_init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config( path)?,
        None => AirtrackConfig::default()
    };

    let feed = OpenSkyClient::from_config( &config)?;
    let engine = TrackingEngine::new( config, feed, LogSink::new())?;

    let mut center = engine.center();
    if let Some(lon) = args.lon { center.lon = lon }
    if let Some(lat) = args.lat { center.lat = lat }
    engine.set_center( GeoPos::new( center.lon, center.lat, 0.0));

    let run_for = match &args.run_for {
        Some(s) => Some( parse_dur( s)?),
        None => None
    };
    let report = parse_dur( &args.report)?;

    let handle = engine.start()?;
    info!("tracking aircraft around {}", center);

    let deadline = shutdown_signal( run_for);
    tokio::pin!(deadline);

    let mut interval = tokio::time::interval( report.max( Duration::from_millis(100)));
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = interval.tick() => {
                let snapshot = handle.snapshot();
                println!("--- {} aircraft, {}", snapshot.len(), handle.stats());
                for ac in snapshot.iter() {
                    println!("  {ac}");
                }
            }
        }
    }

    let mut engine = handle.stop().await?;
    let n = engine.release_all();
    info!("released {} aircraft", n);
    Ok(())
}

fn parse_dur (s: &str)->Result<Duration> {
    parse_duration::parse( s).map_err( |e| anyhow!("invalid duration {s}: {e:?}"))
}

/// resolves after `run_for` or on ctrl-c. If we cannot listen for ctrl-c we log it and resolve right away
async fn shutdown_signal (run_for: Option<Duration>) {
    match run_for {
        Some(dur) => tokio::time::sleep( dur).await,
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("cannot listen for ctrl-c ({e}), stopping");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_after_run_for () {
        let t0 = tokio::time::Instant::now();
        shutdown_signal( Some( Duration::from_secs(90))).await;
        assert!( t0.elapsed() >= Duration::from_secs(90));
    }

    #[test]
    fn test_parse_dur () {
        assert_eq!( parse_dur( "2min").unwrap(), Duration::from_secs(120));
        assert!( parse_dur( "soon").is_err());
    }
}
