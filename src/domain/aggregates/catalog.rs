//! Category and tag records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;
use crate::domain::value_objects::Slug;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub fn create(input: CategoryInput) -> Self {
        Self {
            id: Uuid::now_v7(),
            slug: Slug::from_name(&input.name).into_inner(),
            name: input.name.trim().to_string(),
            description: input.description,
            created_at: Utc::now(),
        }
    }

    pub fn rename(&mut self, input: CategoryInput) {
        self.slug = Slug::from_name(&input.name).into_inner();
        self.name = input.name.trim().to_string();
        self.description = input.description;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct TagInput {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
}

impl Tag {
    pub fn create(input: TagInput) -> Self {
        Self { id: Uuid::now_v7(), name: input.name.trim().to_lowercase(), created_at: Utc::now() }
    }
}
