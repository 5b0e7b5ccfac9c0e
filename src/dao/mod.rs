/// Game, round, and answer storage operations.
pub mod game_store;
/// Storage entity definitions.
pub mod models;
/// Storage abstraction layer shared by all backends.
pub mod storage;
