pub mod constants;
pub mod models;
pub mod profanity;
pub mod shared_wheel_game;
pub mod validation;
