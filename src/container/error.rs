#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid container id: {0:?}")]
    InvalidContainerID(String),
    #[error("invalid port label `{value}`: {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}
pub type Result<T> = std::result::Result<T, Error>;
