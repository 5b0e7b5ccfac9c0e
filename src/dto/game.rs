use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::validation::validate_not_blank;

/// Payload used to create a brand-new game from a question template.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGameRequest {
    #[validate(custom(function = validate_not_blank))]
    pub template_id: String,
}

/// Identifiers returned once a game has been created.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateGameResponse {
    pub game_id: Uuid,
    /// Admin token granting control over the new game.
    pub token: String,
}

/// Payload a player submits to enter a game by join code.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinGameRequest {
    #[validate(custom(function = validate_not_blank))]
    pub code: String,
    #[validate(custom(function = validate_not_blank))]
    pub username: String,
}

/// Identifiers returned to a freshly joined player.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinGameResponse {
    pub game_id: Uuid,
    /// Secret token used for answer submission and the event stream
    /// handshake.
    pub token: String,
}
