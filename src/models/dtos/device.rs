use crate::models::{DeviceCode, DeviceRecord, DeviceStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CheckQueryDto {
    pub device: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponseDto {
    pub ok: bool,
    pub device_code: DeviceCode,
    pub status: DeviceStatus,
    pub plan: String,
    pub expiry: String,
    pub notes: String,
}

/// Body of `/update` and `/admin/api/save`. Absent or null fields become empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SaveDeviceBodyDto {
    pub device: Option<String>,
    pub status: Option<String>,
    pub plan: Option<String>,
    pub expiry: Option<String>,
    pub notes: Option<String>,
}

impl SaveDeviceBodyDto {
    pub fn into_parts(self) -> (Option<DeviceCode>, DeviceRecord) {
        let code = self.device.as_deref().and_then(DeviceCode::parse);
        let record = DeviceRecord {
            status: self.status.unwrap_or_default(),
            plan: self.plan.unwrap_or_default(),
            expiry: self.expiry.map(|it| it.trim().to_string()).unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
        };
        (code, record)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteDeviceBodyDto {
    pub device: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponseDto {
    pub ok: bool,
    pub device_code: DeviceCode,
    pub data: DeviceRecord,
}

#[derive(Debug, Serialize)]
pub struct SaveResponseDto {
    pub ok: bool,
    pub device: DeviceCode,
    pub data: DeviceRecord,
}

#[derive(Debug, Serialize)]
pub struct DeviceItemDto {
    pub device: DeviceCode,
    #[serde(flatten)]
    pub record: DeviceRecord,
}

#[derive(Debug, Serialize)]
pub struct ListResponseDto {
    pub ok: bool,
    pub items: Vec<DeviceItemDto>,
}
