//! View state for the two screens: the search form and the result.
//!
//! Views do not print anything themselves; `render` returns text for the
//! front-end to show.

use std::fmt;

use tracing::{debug, error};

use crate::{
    WeatherReport,
    error::WeatherError,
    provider::WeatherProvider,
    route::Navigation,
};

/// Free-text search input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub q: String,
}

impl SearchForm {
    /// Navigation the form performs when submitted.
    pub fn submit(&self) -> Navigation {
        Navigation::to_result(self.q.trim())
    }
}

#[derive(Debug, Clone, Default)]
pub struct HomeView {
    pub form: SearchForm,
}

impl HomeView {
    /// Open the home view, keeping whatever was last searched in the input.
    pub fn activate(navigation: &Navigation) -> Self {
        let q = navigation.query().unwrap_or_default().to_string();
        Self { form: SearchForm { q } }
    }

    pub fn submit(&self) -> Navigation {
        self.form.submit()
    }

    pub fn render(&self) -> String {
        let mut out = String::from("clima: current weather by city\n");
        if self.form.q.is_empty() {
            out.push_str("Type a city or location to search.");
        } else {
            out.push_str(&format!("Last search: {}", self.form.q));
        }
        out
    }
}

/// Identifies one fetch started by a [`ResultView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

/// A fetch the result view wants performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub token: RequestToken,
    pub query: String,
}

/// Result screen: shows the weather for the `q` of the current navigation.
#[derive(Debug, Default)]
pub struct ResultView {
    query: Option<String>,
    weather: Option<WeatherReport>,
    active: Option<RequestToken>,
    issued: u64,
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn weather(&self) -> Option<&WeatherReport> {
        self.weather.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.active.is_some()
    }

    /// React to a navigation. Returns the fetch to run, or `None` when the
    /// navigation carries no query. Any fetch still in flight is superseded.
    pub fn begin(&mut self, navigation: &Navigation) -> Option<PendingFetch> {
        self.query = navigation.query().map(str::to_string);
        self.weather = None;
        self.active = None;

        let query = self.query.as_deref().filter(|q| !q.is_empty())?.to_string();

        self.issued += 1;
        let token = RequestToken(self.issued);
        self.active = Some(token);

        Some(PendingFetch { token, query })
    }

    /// Apply the outcome of a fetch. Outcomes of superseded fetches are
    /// dropped; failures are logged and leave the view empty. Returns
    /// whether the outcome was applied.
    pub fn finish(
        &mut self,
        token: RequestToken,
        outcome: Result<WeatherReport, WeatherError>,
    ) -> bool {
        if self.active != Some(token) {
            debug!(?token, "discarding response for a superseded query");
            return false;
        }
        self.active = None;

        match outcome {
            Ok(report) => self.weather = Some(report),
            Err(err) => {
                error!(query = self.query.as_deref().unwrap_or_default(), error = %err, "failed to load weather");
            }
        }
        true
    }

    /// `begin`, fetch and `finish` for a single navigation.
    pub async fn activate(&mut self, navigation: &Navigation, provider: &dyn WeatherProvider) {
        let Some(PendingFetch { token, query }) = self.begin(navigation) else {
            return;
        };

        let outcome = provider.current_report(&query).await;
        self.finish(token, outcome);
    }

    pub fn render(&self) -> String {
        let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) else {
            return "No location given. Search from the home view.".to_string();
        };

        let mut out = format!("Weather for \"{query}\"\n");
        if let Some(report) = &self.weather {
            // Writing into a String cannot fail.
            let _ = render_report(&mut out, report);
        }
        out
    }
}

fn render_report(out: &mut impl fmt::Write, report: &WeatherReport) -> fmt::Result {
    let location = &report.location;
    let current = &report.current;

    writeln!(
        out,
        "{}, {}, {} ({}, {})",
        location.name, location.region, location.country, location.latitude, location.longitude
    )?;
    writeln!(out, "Local time: {} ({})", location.localtime, location.timezone_id)?;
    writeln!(
        out,
        "{} ({})",
        current.condition.text,
        if current.is_day() { "day" } else { "night" }
    )?;
    writeln!(
        out,
        "Temperature: {} °C / {} °F, feels like {} °C / {} °F",
        current.temp_c, current.temp_f, current.feels_like_c, current.feels_like_f
    )?;
    writeln!(
        out,
        "Wind: {} km/h ({} mph) {} {}°, gusts {} km/h ({} mph)",
        current.wind_kph,
        current.wind_mph,
        current.wind_dir,
        current.wind_degree,
        current.gust_kph,
        current.gust_mph
    )?;
    writeln!(out, "Pressure: {} mb ({} in)", current.pressure_mb, current.pressure_in)?;
    writeln!(out, "Precipitation: {} mm ({} in)", current.precip_mm, current.precip_in)?;
    writeln!(out, "Humidity: {}%, cloud cover: {}%", current.humidity, current.cloud)?;
    writeln!(
        out,
        "Visibility: {} km ({} miles)",
        current.visibility_km, current.visibility_miles
    )?;
    writeln!(out, "UV index: {}", current.uv)?;
    writeln!(out, "Icon: {}", current.condition.icon_url())?;
    writeln!(out, "Last updated: {}", current.last_updated)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn report_json(name: &str, temp_c: f64) -> Value {
        json!({
            "location": {
                "name": name, "region": "", "country": "Peru",
                "lat": -12.04, "lon": -77.03, "tz_id": "America/Lima",
                "localtime_epoch": 1629383400, "localtime": "2021-08-19 9:30"
            },
            "current": {
                "last_updated_epoch": 1629383400, "last_updated": "2021-08-19 09:30",
                "temp_c": temp_c, "temp_f": 60.8, "is_day": 1,
                "condition": { "text": "Overcast", "icon": "//cdn.weatherapi.com/weather/64x64/day/122.png", "code": 1009 },
                "wind_mph": 6.9, "wind_kph": 11.2, "wind_degree": 200, "wind_dir": "SSW",
                "pressure_mb": 1013.0, "pressure_in": 29.9, "precip_mm": 0.0, "precip_in": 0.0,
                "humidity": 82, "cloud": 100, "feelslike_c": 15.1, "feelslike_f": 59.2,
                "vis_km": 10.0, "vis_miles": 6.0, "uv": 4.0, "gust_mph": 9.2, "gust_kph": 14.8
            }
        })
    }

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherProvider for Counting {
        async fn current(&self, query: &str) -> Result<Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(report_json(query, 16.0))
        }
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl WeatherProvider for Failing {
        async fn current(&self, _query: &str) -> Result<Value, FetchError> {
            Err(FetchError::Upstream {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: None,
                message: "unavailable".into(),
            })
        }
    }

    fn report(name: &str, temp_c: f64) -> WeatherReport {
        WeatherReport::from_json(&report_json(name, temp_c)).unwrap()
    }

    #[test]
    fn search_form_navigates_to_result() {
        let form = SearchForm { q: "  Lima ".into() };
        let nav = form.submit();

        assert_eq!(nav.to_string(), "/result?q=Lima");
        assert_eq!(nav.query(), Some("Lima"));
    }

    #[test]
    fn home_view_prefills_last_query() {
        let nav = Navigation::parse("/home?q=Quito").unwrap();
        let home = HomeView::activate(&nav);

        assert_eq!(home.form.q, "Quito");
        assert!(home.render().contains("Quito"));
        assert_eq!(HomeView::activate(&Navigation::home()).form.q, "");
    }

    #[tokio::test]
    async fn no_query_means_no_fetch() {
        let provider = Counting::default();

        for target in ["/result", "/result?q="] {
            let mut view = ResultView::new();
            view.activate(&Navigation::parse(target).unwrap(), &provider).await;

            assert!(view.weather().is_none());
            assert!(!view.is_loading());
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_fetch_is_displayed() {
        let provider = Counting::default();
        let mut view = ResultView::new();

        view.activate(&Navigation::to_result("Lima"), &provider).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        let weather = view.weather().expect("weather must be shown");
        assert_eq!(weather.location.name, "Lima");

        let text = view.render();
        assert!(text.starts_with("Weather for \"Lima\""));
        assert!(text.contains("Temperature: 16 °C"));
        assert!(text.contains("Overcast (day)"));
        assert!(text.contains("Humidity: 82%"));
    }

    #[tokio::test]
    async fn failed_fetch_leaves_view_empty() {
        let mut view = ResultView::new();

        view.activate(&Navigation::to_result("Lima"), &Failing).await;

        assert!(view.weather().is_none());
        assert!(!view.is_loading());
        assert_eq!(view.query(), Some("Lima"));
        assert_eq!(view.render(), "Weather for \"Lima\"\n");
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut view = ResultView::new();

        let first = view.begin(&Navigation::to_result("Lima")).unwrap();
        let second = view.begin(&Navigation::to_result("Cusco")).unwrap();
        assert_ne!(first.token, second.token);
        assert_eq!(second.query, "Cusco");

        assert!(!view.finish(first.token, Ok(report("Lima", 16.0))));
        assert!(view.weather().is_none());

        assert!(view.finish(second.token, Ok(report("Cusco", 9.0))));
        assert_eq!(view.weather().map(|w| w.location.name.as_str()), Some("Cusco"));
    }

    #[test]
    fn navigating_away_drops_in_flight_fetch() {
        let mut view = ResultView::new();

        let pending = view.begin(&Navigation::to_result("Lima")).unwrap();
        assert!(view.begin(&Navigation::parse("/result").unwrap()).is_none());

        assert!(!view.finish(pending.token, Ok(report("Lima", 16.0))));
        assert!(view.weather().is_none());
    }

    #[test]
    fn a_token_applies_only_once() {
        let mut view = ResultView::new();
        let pending = view.begin(&Navigation::to_result("Lima")).unwrap();

        assert!(view.finish(pending.token, Ok(report("Lima", 16.0))));
        assert!(!view.finish(pending.token, Ok(report("Lima", 30.0))));
        assert_eq!(view.weather().map(|w| w.current.temp_c.as_f64()), Some(16.0));
    }

    #[test]
    fn report_renders_one_line_per_reading() {
        let mut out = String::new();
        render_report(&mut out, &report("Lima", 16.5)).unwrap();

        assert_eq!(out.lines().count(), 12);
        assert!(out.contains("Temperature: 16.5 °C / 60.8 °F"));
        assert!(out.contains("Pressure: 1013 mb (29.9 in)"));
        assert!(out.ends_with("Last updated: 2021-08-19 09:30\n"));
    }

    #[test]
    fn render_without_query_shows_hint() {
        assert!(ResultView::new().render().contains("No location given"));
    }
}
