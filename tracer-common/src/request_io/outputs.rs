use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct OutputStatus {
    pub status: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct OutputResetToken {
    pub reset_token: String,
}
