pub mod library;
pub mod remote;
