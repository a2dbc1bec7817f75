use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use crate::api::errors::ApiError;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

/// Run derive-based validation and map failures to a 400.
pub(crate) fn validate_payload<T: Validate>(payload: &T) -> Result<(), ApiError> {
    payload.validate().map_err(validation_detail)
}

fn validation_detail(errors: ValidationErrors) -> ApiError {
    ApiError::BadRequest(errors.to_string())
}

/// Endpoints that accept either one object or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SingleOrBatch<T> {
    Single(T),
    Batch(Vec<T>),
}

impl<T> SingleOrBatch<T> {
    pub(crate) fn is_batch(&self) -> bool {
        matches!(self, SingleOrBatch::Batch(_))
    }

    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            SingleOrBatch::Single(item) => vec![item],
            SingleOrBatch::Batch(items) => items,
        }
    }
}
