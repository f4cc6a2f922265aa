pub mod admin;
pub mod claims;
pub mod items;
pub mod matches;
