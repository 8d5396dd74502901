pub mod composite;
pub mod compositor;
pub mod scale;
pub(crate) mod text;
