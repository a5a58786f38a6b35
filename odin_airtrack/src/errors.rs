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

use thiserror::Error;

pub type Result<T> = std::result::Result<T,OdinAirtrackError>;

#[derive(Error,Debug)]
pub enum OdinAirtrackError {

    /// the whole feed request failed (transport, HTTP status, timeout or malformed payload)
    #[error("feed unavailable {0}")]
    FeedUnavailable(String),

    /// a single state vector without usable position or identity
    #[error("invalid observation {0}")]
    InvalidObservation(String),

    #[error("parse error {0}")]
    ParseError(String),

    #[error("config error {0}")]
    ConfigError(String),

    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("reqwest error {0}")]
    ReqwestError( #[from] reqwest::Error),

    #[error("serde error {0}")]
    SerdeError( #[from] serde_json::Error),

    #[error("config RON error {0}")]
    RonError( #[from] ron::error::SpannedError),

    #[error("operation failed {0}")]
    OpFailedError(String)
}

impl OdinAirtrackError {
    /// true for errors that mean "no new observations this cycle"
    pub fn is_feed_failure (&self)->bool {
        matches!( self,
            OdinAirtrackError::FeedUnavailable(_) | OdinAirtrackError::ReqwestError(_) | OdinAirtrackError::SerdeError(_)
        )
    }
}

macro_rules! parse_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinAirtrackError::ParseError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use parse_error;

macro_rules! invalid_observation {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinAirtrackError::InvalidObservation( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use invalid_observation;

macro_rules! feed_unavailable {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinAirtrackError::FeedUnavailable( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use feed_unavailable;

macro_rules! config_error {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinAirtrackError::ConfigError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use config_error;

macro_rules! op_failed {
    ($fmt:literal $(, $arg:expr )* ) => {
        crate::errors::OdinAirtrackError::OpFailedError( format!( $fmt $(, $arg)* ))
    };
}
pub (crate) use op_failed;
