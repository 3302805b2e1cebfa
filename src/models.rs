//! Shared models and types
//!
//! Request parameters and success envelopes used by several handlers.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DEVICE_PARAMS_ERROR: &str = "missing param or wrong param type";

/// Standard success envelope: `{"success": true, "code": "OK", ...}`
#[derive(Debug, Clone, Serialize)]
pub struct OkResponse<T = ()> {
    pub success: bool,
    pub code: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub extra: Option<T>,
}

impl OkResponse<()> {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: "OK".to_string(),
            extra: None,
        }
    }
}

impl<T> OkResponse<T> {
    pub fn with(extra: T) -> Self {
        Self {
            success: true,
            code: "OK".to_string(),
            extra: Some(extra),
        }
    }
}

/// Payload of `/set`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusResult {
    pub set_to: i64,
}

/// Payload of `/save_data`
#[derive(Debug, Clone, Serialize)]
pub struct SaveDataResult<T> {
    pub data: T,
}

/// Parameters of `/device/set`, from query string or JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSetParams {
    pub id: String,
    pub show_name: String,
    pub using: bool,
    pub app_name: String,
}

impl DeviceSetParams {
    /// Read `id`, `show_name`, `using`, `app_name` from query parameters
    pub fn from_query(query: &HashMap<String, String>) -> Result<Self> {
        let field = |name: &str| {
            query
                .get(name)
                .cloned()
                .ok_or_else(|| Error::BadRequest(DEVICE_PARAMS_ERROR.to_string()))
        };

        Ok(Self {
            id: field("id")?,
            show_name: field("show_name")?,
            using: parse_bool(&field("using")?)
                .ok_or_else(|| Error::BadRequest(DEVICE_PARAMS_ERROR.to_string()))?,
            app_name: field("app_name")?,
        })
    }

    /// Read the same fields from a JSON object body
    pub fn from_json(body: &serde_json::Value) -> Result<Self> {
        let field = |name: &str| {
            body.get(name)
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::BadRequest(DEVICE_PARAMS_ERROR.to_string()))
        };

        Ok(Self {
            id: field("id")?,
            show_name: field("show_name")?,
            using: body
                .get("using")
                .and_then(json_bool)
                .ok_or_else(|| Error::BadRequest(DEVICE_PARAMS_ERROR.to_string()))?,
            app_name: field("app_name")?,
        })
    }
}

/// Parse a boolean-ish string (`true/false`, `yes/no`, `y/n`, `1/0`, `on/off`)
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Boolean from a JSON value: native bools, numbers 0/1, or boolean-ish strings
pub fn json_bool(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        serde_json::Value::String(s) => parse_bool(s),
        _ => None,
    }
}
