//! Common DTOs shared by every configuration source.
use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::basic::error::ConfError;
use crate::basic::result::ConfResult;

/// Flat mapping from config key to value, produced fresh on every pull.
pub type ConfigDocument = HashMap<String, Value>;

/// Config documents grouped by the source id the server reported them under.
pub type GroupedConfigDocument = HashMap<String, ConfigDocument>;

pub const MAX_DIMENSION_INFO_LEN: usize = 256;

lazy_static! {
    static ref DIMENSION_INFO_REGEX: Regex = Regex::new(r#"\A[^$%&+()/\[\]" ]*\z"#).expect("[ConfSource.Dimension] invalid dimension regex");
}

/// Which configuration document set to retrieve.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum Dimension {
    Labels {
        service_name: String,
        version: String,
        app: String,
        environment: String,
    },
    /// A dimension string supplied verbatim by the caller.
    Raw(String),
}

impl Dimension {
    pub fn new(service_name: &str, version: &str, app: &str, environment: &str) -> Self {
        Dimension::Labels {
            service_name: service_name.to_string(),
            version: version.to_string(),
            app: app.to_string(),
            environment: environment.to_string(),
        }
    }

    pub fn raw(dimension_info: &str) -> Self {
        Dimension::Raw(dimension_info.to_string())
    }

    /// Render the `dimensionsInfo` value understood by the config center.
    ///
    /// Labels become `service[@app][#version]`, raw strings are returned unchanged.
    pub fn to_dimension_info(&self) -> ConfResult<String> {
        match self {
            Dimension::Raw(dimension_info) => Ok(dimension_info.clone()),
            Dimension::Labels { service_name, version, app, .. } => {
                let mut dimension_info = service_name.clone();
                if !app.is_empty() {
                    dimension_info = format!("{dimension_info}@{app}");
                }
                if !version.is_empty() {
                    dimension_info = format!("{dimension_info}#{version}");
                }
                if dimension_info.len() > MAX_DIMENSION_INFO_LEN {
                    return Err(ConfError::FormatError(format!(
                        "[ConfSource.Dimension] exceeded max value {} for dimensionInfo {} with length {}",
                        MAX_DIMENSION_INFO_LEN,
                        dimension_info,
                        dimension_info.len()
                    )));
                }
                if !DIMENSION_INFO_REGEX.is_match(&dimension_info) {
                    return Err(ConfError::FormatError(format!("[ConfSource.Dimension] invalid value for dimension info: {dimension_info}")));
                }
                Ok(dimension_info)
            }
        }
    }

    pub fn service_name(&self) -> &str {
        match self {
            Dimension::Labels { service_name, .. } => service_name,
            Dimension::Raw(dimension_info) => dimension_info,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Dimension::Labels { version, .. } => version,
            Dimension::Raw(_) => "",
        }
    }

    pub fn app(&self) -> &str {
        match self {
            Dimension::Labels { app, .. } => app,
            Dimension::Raw(_) => "",
        }
    }

    pub fn environment(&self) -> &str {
        match self {
            Dimension::Labels { environment, .. } => environment,
            Dimension::Raw(_) => "",
        }
    }
}

/// Percent-encode the `#` separator so the dimension survives as a query value.
pub fn encode_dimension_info(dimension_info: &str) -> String {
    dimension_info.replace('#', "%23")
}
