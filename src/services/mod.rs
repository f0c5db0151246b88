pub mod id;
pub mod upload;
