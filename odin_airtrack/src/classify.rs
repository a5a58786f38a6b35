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

use crate::Classification;

/// strategy to derive a [`Classification`] from a callsign. This is only called once per aircraft,
/// when it first shows up in the registry
pub trait Classifier: Send + Sync {
    fn classify (&self, callsign: &str)->Classification;
}

/// U.S. registration convention: general aviation aircraft fly under their tail number ("N12345")
/// whereas airlines use ICAO operator prefixes ("BAW123"). This obviously does not hold outside
/// of the U.S. airspace
#[derive(Debug,Default,Clone,Copy)]
pub struct TailNumberClassifier;

impl Classifier for TailNumberClassifier {
    fn classify (&self, callsign: &str)->Classification {
        if callsign.starts_with('N') { Classification::Light } else { Classification::Heavy }
    }
}

impl<F> Classifier for F where F: Fn(&str)->Classification + Send + Sync {
    fn classify (&self, callsign: &str)->Classification { self(callsign) }
}
