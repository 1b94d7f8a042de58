//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Summary of one live room projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub member_count: usize,
}
