use lms_db::models::RelationType;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AddPrerequisiteRequest {
    pub prerequisite_course_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddRelationRequest {
    pub target_course_id: Uuid,
    pub relation_type: RelationType,
}
