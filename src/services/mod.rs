/// OpenAPI documentation generation.
pub mod documentation;
/// Persistent-connection registry and event fan-out.
pub mod event_service;
/// Game creation and join handling.
pub mod game_service;
/// Pure ranking and scoring computations.
pub mod ranking;
/// Round lifecycle and finalisation orchestration.
pub mod round_service;
