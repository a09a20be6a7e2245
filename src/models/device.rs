use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// Normalized device code: trimmed and uppercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceCode(String);

impl DeviceCode {
    /// Returns `None` when nothing but whitespace was supplied.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_uppercase()))
        }
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    /// Key of the record seeded into a fresh store.
    pub fn example() -> Self {
        Self(String::from("EXAMPLE01"))
    }
}

impl Deref for DeviceCode {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for DeviceCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored state of one device. Saved and replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
    pub status: String,
    pub plan: String,
    /// ISO-8601 timestamp, empty when the record never expires
    pub expiry: String,
    pub notes: String,
}

impl DeviceRecord {
    pub const ACTIVE: &'static str = "active";

    pub fn example() -> Self {
        Self {
            status: String::from(Self::ACTIVE),
            plan: String::from("Monthly"),
            expiry: String::from("2026-01-31T23:59:59Z"),
            notes: String::from("Test device"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Active,
    Inactive,
    NotFound,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Inactive => "inactive",
            DeviceStatus::NotFound => "not_found",
        }
    }
}

impl Display for DeviceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
