use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Classroom;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassroomCreate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassroomUpdate {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassroomResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) owner_id: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ClassroomResponse {
    pub(crate) fn from_db(classroom: Classroom) -> Self {
        Self {
            id: classroom.id,
            name: classroom.name,
            owner_id: classroom.owner_id,
            created_at: format_primitive(classroom.created_at),
            updated_at: format_primitive(classroom.updated_at),
        }
    }
}
