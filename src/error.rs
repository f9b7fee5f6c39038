pub trait ResultOkLogExt<T, E> {
    /// Converts the result into an [`Option`], logging the error at `level`.
    fn ok_log(self, level: log::Level) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, level: log::Level) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::log!(level, "{err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_log() {
        let ok: Result<u8, std::fmt::Error> = Ok(1);
        assert_eq!(ok.ok_log(log::Level::Warn), Some(1));

        let err: Result<u8, std::fmt::Error> = Err(std::fmt::Error);
        assert_eq!(err.ok_log(log::Level::Warn), None);
    }
}
