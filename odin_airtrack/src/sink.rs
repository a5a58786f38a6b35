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

use std::{fmt::Debug, sync::Arc};
use tracing::{debug,trace};

use crate::{Classification, GeoPos};

/// the consumer side of the registry (e.g. a 3D overlay).
/// Every aircraft in the registry has exactly one handle that was obtained through `on_create` and that is
/// released through `on_remove`. Notifications are issued from within the tick task and should not block
pub trait RenderSink: Send + 'static {
    type Handle: Clone + Debug + Send + Sync + 'static;

    fn on_create (&mut self, callsign: &str, position: &GeoPos, classification: Classification, heading: f64)->Self::Handle;

    /// `heading` is `None` if only the position changed
    fn on_update (&mut self, handle: &Self::Handle, position: &GeoPos, heading: Option<f64>);

    fn on_remove (&mut self, handle: Self::Handle);
}

/// a RenderSink that just traces notifications. Useful for headless operation
#[derive(Debug,Default)]
pub struct LogSink {
    n_live: usize,
}

impl LogSink {
    pub fn new()->Self { LogSink::default() }

    pub fn n_live (&self)->usize { self.n_live }
}

impl RenderSink for LogSink {
    type Handle = Arc<str>;

    fn on_create (&mut self, callsign: &str, position: &GeoPos, classification: Classification, heading: f64)->Self::Handle {
        self.n_live += 1;
        debug!("create {callsign} ({classification:?}) at {position}, hdg {heading:.0}");
        Arc::from( callsign)
    }

    fn on_update (&mut self, handle: &Self::Handle, position: &GeoPos, heading: Option<f64>) {
        trace!("update {handle} at {position}, hdg {heading:?}");
    }

    fn on_remove (&mut self, handle: Self::Handle) {
        self.n_live = self.n_live.saturating_sub(1);
        debug!("remove {handle}");
    }
}
