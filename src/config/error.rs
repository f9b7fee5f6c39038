#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value `{value}` for `{var}`: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("`{0}` must be greater than zero")]
    ZeroDuration(&'static str),
    #[error("invalid `DOCKER_HOST`: {0}")]
    DockerHost(#[source] crate::docker::Error),
    #[error(transparent)]
    Mode(#[from] crate::collector::UnknownMode),
}

pub type Result<T> = std::result::Result<T, Error>;
