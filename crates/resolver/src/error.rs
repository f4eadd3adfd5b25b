use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolverError>;

#[derive(Error, Debug, PartialEq)]
pub enum ResolverError {
    #[error("Invalid threshold {name}: {value} (expected a finite value in [0, 1])")]
    InvalidThreshold { name: &'static str, value: f64 },
}
