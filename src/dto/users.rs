use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{entity::users, models::User, routes::params::Pagination};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub q: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct UserList {
    #[schema(value_type = Vec<User>)]
    pub items: Vec<User>,
}

/// Contact details a user can see and edit about themselves.
#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<users::Model> for Profile {
    fn from(model: users::Model) -> Self {
        Self {
            name: model.name,
            email: model.email,
            phone: model.phone,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub phone: String,
}
