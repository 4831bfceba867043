//! Status code keyed catalog of problem details factories

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use problem_details::{CLIENT_ERRORS, ProblemDef, ProblemDetails};

use crate::context::ActionContext;

type ProblemFn = dyn Fn(&ActionContext) -> ProblemDetails + Send + Sync;

/// Produces a new [`ProblemDetails`] for every call.
///
/// Factories hand out owned values, so nothing a caller does to the returned
/// problem can leak into the next request.
#[derive(Clone)]
pub struct ProblemDetailsFactory(Arc<ProblemFn>);

impl ProblemDetailsFactory {
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ActionContext) -> ProblemDetails + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Factory reproducing a static template.
    #[must_use]
    pub fn from_def(def: ProblemDef) -> Self {
        Self::new(move |_| def.as_problem())
    }

    #[must_use]
    pub fn create(&self, ctx: &ActionContext) -> ProblemDetails {
        (self.0)(ctx)
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ProblemDetailsFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProblemDetailsFactory").finish_non_exhaustive()
    }
}

/// Mapping from HTTP status code to the factory rendering it.
#[derive(Clone, Debug)]
pub struct ProblemDetailsCatalog {
    entries: HashMap<u16, ProblemDetailsFactory>,
}

impl ProblemDetailsCatalog {
    /// Catalog with no entries at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn lookup(&self, status: StatusCode) -> Option<&ProblemDetailsFactory> {
        self.entries.get(&status.as_u16())
    }

    /// Register or replace the factory for `status`, returning the previous one.
    pub fn set(
        &mut self,
        status: StatusCode,
        factory: ProblemDetailsFactory,
    ) -> Option<ProblemDetailsFactory> {
        let previous = self.entries.insert(status.as_u16(), factory);
        tracing::debug!(
            status = status.as_u16(),
            replaced = previous.is_some(),
            "problem details factory registered"
        );
        previous
    }

    pub fn remove(&mut self, status: StatusCode) -> Option<ProblemDetailsFactory> {
        let removed = self.entries.remove(&status.as_u16());
        tracing::debug!(
            status = status.as_u16(),
            removed = removed.is_some(),
            "problem details factory removed"
        );
        removed
    }

    #[must_use]
    pub fn contains(&self, status: StatusCode) -> bool {
        self.entries.contains_key(&status.as_u16())
    }

    /// Run the factory for `status`, if one is registered.
    #[must_use]
    pub fn create(&self, status: StatusCode, ctx: &ActionContext) -> Option<ProblemDetails> {
        self.lookup(status).map(|factory| factory.create(ctx))
    }

    /// Registered status codes in ascending order.
    #[must_use]
    pub fn statuses(&self) -> Vec<StatusCode> {
        let mut codes: Vec<StatusCode> = self
            .entries
            .keys()
            .filter_map(|code| StatusCode::from_u16(*code).ok())
            .collect();
        codes.sort_unstable();
        codes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProblemDetailsCatalog {
    /// The well-known 400, 401 and 404 entries.
    fn default() -> Self {
        let entries = CLIENT_ERRORS
            .iter()
            .map(|def| (def.status.as_u16(), ProblemDetailsFactory::from_def(*def)))
            .collect();
        Self { entries }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_exact_entries() {
        let catalog = ProblemDetailsCatalog::default();
        let ctx = ActionContext::new("/");

        assert_eq!(
            catalog.statuses(),
            vec![
                StatusCode::BAD_REQUEST,
                StatusCode::UNAUTHORIZED,
                StatusCode::NOT_FOUND
            ]
        );

        let expected = [
            (
                400,
                "https://tools.ietf.org/html/rfc7231#section-6.5.1",
                "Unable to process the request due to a client error.",
            ),
            (
                401,
                "https://tools.ietf.org/html/rfc7235#section-3.1",
                "Authentication is required and has failed or has not yet been provided.",
            ),
            (
                404,
                "https://tools.ietf.org/html/rfc7231#section-6.5.4",
                "The server has not found anything matching the Request-URI",
            ),
        ];
        for (code, type_url, detail) in expected {
            let status = StatusCode::from_u16(code).unwrap();
            let p = catalog.create(status, &ctx).unwrap();
            assert_eq!(p.status, status);
            assert_eq!(p.type_url, type_url);
            assert_eq!(p.detail.as_deref(), Some(detail));
            assert!(p.title.is_none());
            assert!(p.instance.is_none());
            assert!(p.extensions.is_empty());
        }
    }

    #[test]
    fn factories_return_fresh_instances() {
        let catalog = ProblemDetailsCatalog::default();
        let ctx = ActionContext::new("/");

        let mut first = catalog.create(StatusCode::NOT_FOUND, &ctx).unwrap();
        first.detail = Some("mutated".to_owned());
        first.status = StatusCode::GONE;

        let second = catalog.create(StatusCode::NOT_FOUND, &ctx).unwrap();
        assert_eq!(second.status, StatusCode::NOT_FOUND);
        assert_eq!(
            second.detail.as_deref(),
            Some("The server has not found anything matching the Request-URI")
        );
    }

    #[test]
    fn set_replace_and_remove() {
        let mut catalog = ProblemDetailsCatalog::default();

        let teapot = ProblemDetailsFactory::new(|ctx| {
            ProblemDetails::new(StatusCode::IM_A_TEAPOT).with_detail(format!("no coffee at {}", ctx.path))
        });
        assert!(catalog.set(StatusCode::IM_A_TEAPOT, teapot.clone()).is_none());
        assert!(catalog.lookup(StatusCode::IM_A_TEAPOT).unwrap().ptr_eq(&teapot));

        let p = catalog
            .create(StatusCode::IM_A_TEAPOT, &ActionContext::new("/brew"))
            .unwrap();
        assert_eq!(p.status, StatusCode::IM_A_TEAPOT);
        assert_eq!(p.detail.as_deref(), Some("no coffee at /brew"));

        let replaced = catalog.set(
            StatusCode::NOT_FOUND,
            ProblemDetailsFactory::new(|_| ProblemDetails::new(StatusCode::NOT_FOUND).with_title("Missing")),
        );
        assert!(replaced.is_some());
        let p = catalog.create(StatusCode::NOT_FOUND, &ActionContext::default()).unwrap();
        assert_eq!(p.title.as_deref(), Some("Missing"));

        assert!(catalog.remove(StatusCode::UNAUTHORIZED).is_some());
        assert!(catalog.lookup(StatusCode::UNAUTHORIZED).is_none());
        assert!(catalog.remove(StatusCode::UNAUTHORIZED).is_none());
    }

    #[test]
    fn lookup_of_unregistered_status_is_absent() {
        let catalog = ProblemDetailsCatalog::default();
        assert!(catalog.lookup(StatusCode::INTERNAL_SERVER_ERROR).is_none());
        assert!(ProblemDetailsCatalog::empty().is_empty());
    }
}
