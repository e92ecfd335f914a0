use std::convert::Infallible;

use http::StatusCode;

use crate::{body::BodyError, layers::xml_body::XmlBodyError, IntoResponse, Response};

pub type BoxError = Box<dyn core::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    XmlBody(#[from] XmlBodyError),

    #[error(transparent)]
    Body(#[from] BodyError),

    #[error("Not Found")]
    NotFound,

    #[error("Missing Extension")]
    MissingExtension,
}

impl From<Infallible> for Error {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

impl Error {
    /// The HTTP status this error should be rendered with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Error::XmlBody(e) => e.status(),
            Error::Body(e) => e.status(),
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::MissingExtension => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            log::error!("Internal error: {self}");
        }

        (self.to_string(), status).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::from(XmlBodyError::EmptyBody).status(), StatusCode::LENGTH_REQUIRED);
        assert_eq!(Error::from(BodyError::LengthLimitError).status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(Error::from(BodyError::StreamAborted).status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::MissingExtension.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_keeps_status() {
        let resp = Error::from(XmlBodyError::EmptyBody).into_response();
        assert_eq!(resp.status(), StatusCode::LENGTH_REQUIRED);
    }
}
