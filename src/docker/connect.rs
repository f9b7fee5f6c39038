use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use http_body_util::Empty;
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;

use super::{Error, Result};

pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Address of a Docker Engine, in `DOCKER_HOST` notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerHost {
    /// `unix:///var/run/docker.sock`
    Unix(PathBuf),
    /// `tcp://host:port` or `http://host:port`, stored as `host:port`.
    Tcp(String),
}

impl Default for DockerHost {
    fn default() -> Self {
        Self::Unix(PathBuf::from("/var/run/docker.sock"))
    }
}

impl FromStr for DockerHost {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(Error::UnsupportedHost(s.to_owned()));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        let authority = s
            .strip_prefix("tcp://")
            .or_else(|| s.strip_prefix("http://"))
            .map(|rest| rest.trim_end_matches('/'))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| Error::UnsupportedHost(s.to_owned()))?;

        Ok(Self::Tcp(authority.to_owned()))
    }
}

impl fmt::Display for DockerHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp(authority) => write!(f, "tcp://{authority}"),
        }
    }
}

impl DockerHost {
    /// Value of the `Host` header for requests to this engine.
    pub(super) fn host_header(&self) -> &str {
        match self {
            Self::Unix(_) => "docker",
            Self::Tcp(authority) => authority,
        }
    }

    /// Opens a fresh connection and sends a single request over it.
    pub(super) async fn send(&self, request: Request<Empty<Bytes>>) -> Result<Response<Incoming>> {
        let path = request.uri().path().to_owned();
        match self {
            Self::Unix(socket) => {
                let stream = tokio::net::UnixStream::connect(socket)
                    .await
                    .map_err(|source| Error::Connect {
                        host: self.to_string(),
                        source,
                    })?;
                send_over(TokioIo::new(stream), request, path).await
            }
            Self::Tcp(authority) => {
                let stream = tokio::net::TcpStream::connect(authority.as_str())
                    .await
                    .map_err(|source| Error::Connect {
                        host: self.to_string(),
                        source,
                    })?;
                send_over(TokioIo::new(stream), request, path).await
            }
        }
    }
}

async fn send_over<I>(
    io: I,
    request: Request<Empty<Bytes>>,
    path: String,
) -> Result<Response<Incoming>>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, connection) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(Error::Handshake)?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            log::debug!("docker connection closed with error: {}", err);
        }
    });

    sender
        .send_request(request)
        .await
        .map_err(|source| Error::Request { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unix_host() {
        assert_eq!(
            DEFAULT_DOCKER_HOST.parse::<DockerHost>().unwrap(),
            DockerHost::default()
        );
        assert_eq!(
            "unix:///run/user/1000/docker.sock".parse::<DockerHost>().unwrap(),
            DockerHost::Unix(PathBuf::from("/run/user/1000/docker.sock"))
        );
    }

    #[test]
    fn test_parse_tcp_host() {
        assert_eq!(
            "tcp://127.0.0.1:2375".parse::<DockerHost>().unwrap(),
            DockerHost::Tcp("127.0.0.1:2375".to_owned())
        );
        assert_eq!(
            "http://docker-proxy:2375/".parse::<DockerHost>().unwrap(),
            DockerHost::Tcp("docker-proxy:2375".to_owned())
        );
    }

    #[test]
    fn test_parse_unsupported_host() {
        for raw in ["", "unix://", "tcp://", "ssh://user@host", "/var/run/docker.sock"] {
            assert!(
                matches!(raw.parse::<DockerHost>(), Err(Error::UnsupportedHost(_))),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_display_round_trips() {
        let host = DockerHost::Tcp("10.0.0.1:2375".to_owned());
        assert_eq!(host.to_string().parse::<DockerHost>().unwrap(), host);
        assert_eq!(DockerHost::default().to_string(), DEFAULT_DOCKER_HOST);
    }
}
