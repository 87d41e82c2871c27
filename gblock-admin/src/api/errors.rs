use gblock_core::global_blocks::RequestError;
use poem_openapi::Object;

#[derive(Object, Debug)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Request failures, in the order they were detected.
#[derive(Object, Debug)]
pub struct ErrorList {
    pub errors: Vec<ApiError>,
}

impl ErrorList {
    pub fn single(code: &str, message: impl Into<String>) -> Self {
        Self {
            errors: vec![ApiError {
                code: code.to_owned(),
                message: message.into(),
            }],
        }
    }
}

impl From<&RequestError> for ErrorList {
    fn from(error: &RequestError) -> Self {
        Self::single(error.code(), error.to_string())
    }
}
