//! Path-based routing between the home and result views.
//!
//! Navigation targets look like browser locations (`/result?q=Paris`); the
//! query string carries the search between views.

use std::fmt;

use url::{Url, form_urlencoded};

use crate::error::RouteError;

/// Query parameter carrying the free-text location.
pub const QUERY_PARAM: &str = "q";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Result,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Result => "result",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path())
    }
}

/// A parsed location: path plus decoded query parameters, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    path: String,
    params: Vec<(String, String)>,
}

impl Navigation {
    /// Accepts absolute URLs as well as bare paths such as `result?q=Oslo`.
    pub fn parse(target: &str) -> Result<Self, RouteError> {
        let base = Url::parse("app://clima/").map_err(|source| RouteError {
            target: target.to_string(),
            source,
        })?;
        let url = Url::options().base_url(Some(&base)).parse(target).map_err(|source| {
            RouteError { target: target.to_string(), source }
        })?;

        Ok(Self {
            path: url.path().trim_matches('/').to_string(),
            params: url.query_pairs().into_owned().collect(),
        })
    }

    pub fn home() -> Self {
        Self { path: Route::Home.path().to_string(), params: Vec::new() }
    }

    /// Where a submitted search goes.
    pub fn to_result(query: &str) -> Self {
        Self {
            path: Route::Result.path().to_string(),
            params: vec![(QUERY_PARAM.to_string(), query.to_string())],
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn query(&self) -> Option<&str> {
        self.query_param(QUERY_PARAM)
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.path)?;
        if !self.params.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.params)
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Maps paths to views. Unknown paths fall back to the home view.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<(String, Route)>,
    fallback: Route,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            routes: vec![
                (String::new(), Route::Home),
                (Route::Home.path().to_string(), Route::Home),
                (Route::Result.path().to_string(), Route::Result),
            ],
            fallback: Route::Home,
        }
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, navigation: &Navigation) -> Route {
        self.routes
            .iter()
            .find(|(path, _)| path == navigation.path())
            .map(|(_, route)| *route)
            .unwrap_or(self.fallback)
    }

    pub fn navigate(&self, target: &str) -> Result<(Route, Navigation), RouteError> {
        let navigation = Navigation::parse(target)?;
        Ok((self.resolve(&navigation), navigation))
    }
}
