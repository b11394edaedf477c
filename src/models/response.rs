use serde::Serialize;

// ==================== API RESPONSE ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wraps `data` in the success envelope.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
