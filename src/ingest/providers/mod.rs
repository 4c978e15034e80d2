pub mod steam_featured;
pub mod steam_specials;
