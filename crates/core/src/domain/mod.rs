pub mod menu;
pub mod pairing;
