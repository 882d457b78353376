//! JSON test vector loader shared by the codec tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;

use cfws_core::protocol::CodePolicy;

#[derive(Debug, Deserialize)]
pub struct ClassifyVector {
    pub description: String,
    /// Frame text; `null` models a message event without data.
    pub frame: Option<String>,
    #[serde(default)]
    pub registered_channels: Vec<String>,
    #[serde(default)]
    pub code_policy: CodePolicy,
    pub expect: Expect,
}

#[derive(Debug, Deserialize)]
pub struct Expect {
    pub category: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub body: Option<serde_json::Value>,
}

pub fn load(name: &str) -> ClassifyVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap_or_else(|e| panic!("bad vector {name}: {e}"))
}
