use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::common::model::{GranularitySetting, GranularityUnit};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GranularityRequest {
    #[validate(range(min = 1, max = 1000))]
    pub magnitude: u32,
    pub unit: GranularityUnit,
}

impl From<GranularityRequest> for GranularitySetting {
    fn from(req: GranularityRequest) -> Self {
        GranularitySetting::new(req.magnitude, req.unit)
    }
}
