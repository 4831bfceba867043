//! Well-known client error templates

use http::StatusCode;

use crate::problem::ProblemDetails;

/// Static problem template for a single status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemDef {
    pub status: StatusCode,
    pub type_url: &'static str,
    pub detail: &'static str,
}

impl ProblemDef {
    /// Build a fresh problem from this template.
    #[inline]
    pub fn as_problem(&self) -> ProblemDetails {
        ProblemDetails::new(self.status)
            .with_type(self.type_url)
            .with_detail(self.detail)
    }
}

pub const BAD_REQUEST: ProblemDef = ProblemDef {
    status: StatusCode::BAD_REQUEST,
    type_url: "https://tools.ietf.org/html/rfc7231#section-6.5.1",
    detail: "Unable to process the request due to a client error.",
};

pub const UNAUTHORIZED: ProblemDef = ProblemDef {
    status: StatusCode::UNAUTHORIZED,
    type_url: "https://tools.ietf.org/html/rfc7235#section-3.1",
    detail: "Authentication is required and has failed or has not yet been provided.",
};

pub const NOT_FOUND: ProblemDef = ProblemDef {
    status: StatusCode::NOT_FOUND,
    type_url: "https://tools.ietf.org/html/rfc7231#section-6.5.4",
    detail: "The server has not found anything matching the Request-URI",
};

/// Every template shipped by default, in ascending status order.
pub const CLIENT_ERRORS: &[ProblemDef] = &[BAD_REQUEST, UNAUTHORIZED, NOT_FOUND];
