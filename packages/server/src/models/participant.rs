use serde::{Deserialize, Serialize};

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ParticipantListQuery {
    /// Only participants who joined this competition.
    pub competition: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ParticipantResponse {
    pub id: i32,
    pub user_id: i32,
    #[schema(example = "alice_wonder")]
    pub username: String,
    pub institution: String,
    pub phone: String,
    /// IDs of joined competitions, ascending.
    pub competitions: Vec<i32>,
}
