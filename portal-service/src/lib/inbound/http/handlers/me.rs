use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiSuccess;
use crate::account::models::RequestIdentity;

pub async fn me(Extension(identity): Extension<RequestIdentity>) -> ApiSuccess<MeData> {
    ApiSuccess::new(StatusCode::OK, MeData::from(&identity))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeData {
    pub user_id: i64,
    pub username: String,
    pub privileges: u64,
    pub privilege_names: Vec<&'static str>,
    pub flags: u64,
    pub clan_id: i64,
    pub clan_is_owner: bool,
}

impl From<&RequestIdentity> for MeData {
    fn from(identity: &RequestIdentity) -> Self {
        Self {
            user_id: identity.user_id.0,
            username: identity.username.clone(),
            privileges: identity.privileges.bits(),
            privilege_names: identity.privileges.names(),
            flags: identity.flags.bits(),
            clan_id: identity.clan_id,
            clan_is_owner: identity.clan_is_owner,
        }
    }
}
