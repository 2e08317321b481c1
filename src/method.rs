//! Method constraints for routes.
//!
//! Requests carry an [`http::Method`], which is always uppercase on the wire
//! and covers extension methods (`PURGE`, WebDAV verbs, …) as well as the
//! RFC 9110 set. A route either names one of them or accepts all of them.

use std::fmt;

use http::Method;

/// Which request methods a route accepts.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum MethodFilter {
    /// Any method, as registered through [`Router::any`](crate::Router::any).
    Any,
    Only(Method),
}

impl MethodFilter {
    /// `true` if a request with `method` may be dispatched to the route.
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(m) => m == method,
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ANY"),
            Self::Only(m) => f.write_str(m.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_allows_everything() {
        for m in [Method::GET, Method::POST, Method::OPTIONS, Method::from_bytes(b"PURGE").unwrap()] {
            assert!(MethodFilter::Any.allows(&m));
        }
    }

    #[test]
    fn only_allows_its_method() {
        let filter = MethodFilter::from(Method::DELETE);
        assert!(filter.allows(&Method::DELETE));
        assert!(!filter.allows(&Method::GET));
        assert_eq!(filter.to_string(), "DELETE");
    }
}
