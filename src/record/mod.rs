pub mod encoder;
pub mod sink;
