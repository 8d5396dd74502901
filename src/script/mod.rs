pub mod orp;
pub mod tokenize;
