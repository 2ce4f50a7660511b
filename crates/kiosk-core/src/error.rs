use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid chip UID: {0}")]
    InvalidUid(String),

    #[error("Tunable {name} must be a positive number of milliseconds, got {value}")]
    InvalidTunable { name: &'static str, value: u64 },
}

pub type Result<T> = std::result::Result<T, Error>;
