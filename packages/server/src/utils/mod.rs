pub mod cascade;
pub mod filename;
pub mod hash;
pub mod jwt;
pub mod lookup;
pub mod profile;
pub mod upload;
