pub mod bootstrap;
pub mod extractor;
pub mod jwt;
pub mod password;
