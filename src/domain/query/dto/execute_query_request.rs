use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExecuteQueryRequest {
    /// Script text. Blank text is not a validation error: it comes back as a
    /// failed execution.
    #[validate(length(max = 20000))]
    pub code: String,
}
