pub mod audiobox;
pub mod sync;
