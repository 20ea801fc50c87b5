//! Road-routing backends.
//!
//! `OsrmClient` talks to an OSRM-compatible HTTP API. Anything else that can
//! answer point-to-point and one-to-many queries can implement
//! [`RoutingService`] and be handed to the distance provider.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::warehouse::GeoPoint;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing request timed out after {0:?}")]
    Timeout(Duration),

    #[error("routing transport error: {0}")]
    Transport(String),

    #[error("routing service returned HTTP {0}")]
    Status(u16),

    #[error("routing service answered {code}: {message}")]
    Upstream { code: String, message: String },

    #[error("malformed routing payload: {0}")]
    Malformed(String),

    #[error("no route between points")]
    Unroutable,
}

/// One road leg as reported by the routing backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    pub distance_m: f64,
    pub duration_s: f64,
    pub raw: Option<Value>,
}

impl RouteLeg {
    pub fn new(distance_m: f64, duration_s: f64) -> Self {
        Self {
            distance_m,
            duration_s,
            raw: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.distance_m.is_finite()
            && self.duration_s.is_finite()
            && self.distance_m >= 0.0
            && self.duration_s >= 0.0
    }
}

#[async_trait]
pub trait RoutingService: Send + Sync {
    async fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteLeg, RoutingError>;

    /// Many-to-one lookup, one entry per origin in input order. Entries the
    /// backend could not route are `None`.
    async fn table(
        &self,
        origins: &[GeoPoint],
        destination: GeoPoint,
    ) -> Result<Vec<Option<RouteLeg>>, RoutingError>;
}

pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
    profile: String,
    timeout: Duration,
}

impl OsrmClient {
    pub fn new(base_url: &str, profile: &str, timeout: Duration) -> Result<Self, RoutingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RoutingError::Transport(format!("failed to build client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile: profile.to_string(),
            timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> RoutingError {
        if err.is_timeout() {
            RoutingError::Timeout(self.timeout)
        } else {
            RoutingError::Transport(err.to_string())
        }
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, RoutingError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await.map_err(|err| self.classify(err))?;
        serde_json::from_slice(&bytes).map_err(|err| RoutingError::Malformed(err.to_string()))
    }
}

/// OSRM wants `lng,lat` pairs joined with `;`.
fn coordinates_path(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.lng, p.lat))
        .collect::<Vec<_>>()
        .join(";")
}

#[async_trait]
impl RoutingService for OsrmClient {
    async fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteLeg, RoutingError> {
        let url = format!(
            "{}/route/v1/{}/{}",
            self.base_url,
            self.profile,
            coordinates_path(&[origin, destination])
        );
        let body = self.get_json(&url, &[("overview", "false")]).await?;
        parse_route(body)
    }

    async fn table(
        &self,
        origins: &[GeoPoint],
        destination: GeoPoint,
    ) -> Result<Vec<Option<RouteLeg>>, RoutingError> {
        if origins.is_empty() {
            return Ok(Vec::new());
        }

        let mut points = Vec::with_capacity(origins.len() + 1);
        points.extend_from_slice(origins);
        points.push(destination);

        let url = format!(
            "{}/table/v1/{}/{}",
            self.base_url,
            self.profile,
            coordinates_path(&points)
        );
        let sources = (0..origins.len())
            .map(|index| index.to_string())
            .collect::<Vec<_>>()
            .join(";");
        let destinations = origins.len().to_string();
        let body = self
            .get_json(
                &url,
                &[
                    ("sources", sources.as_str()),
                    ("destinations", destinations.as_str()),
                    ("annotations", "distance,duration"),
                ],
            )
            .await?;
        parse_table(body, origins.len())
    }
}

#[derive(Deserialize)]
struct StatusEnvelope {
    code: String,
    #[serde(default)]
    message: Option<String>,
}

fn check_status(body: &Value) -> Result<(), RoutingError> {
    let envelope: StatusEnvelope = serde_json::from_value(body.clone())
        .map_err(|err| RoutingError::Malformed(err.to_string()))?;

    if envelope.code != "Ok" {
        return Err(RoutingError::Upstream {
            code: envelope.code,
            message: envelope.message.unwrap_or_default(),
        });
    }
    Ok(())
}

pub fn parse_route(body: Value) -> Result<RouteLeg, RoutingError> {
    check_status(&body)?;

    let route = body
        .get("routes")
        .and_then(Value::as_array)
        .and_then(|routes| routes.first())
        .ok_or(RoutingError::Unroutable)?;

    let distance_m = route
        .get("distance")
        .and_then(Value::as_f64)
        .ok_or_else(|| RoutingError::Malformed("route has no distance".to_string()))?;
    let duration_s = route
        .get("duration")
        .and_then(Value::as_f64)
        .ok_or_else(|| RoutingError::Malformed("route has no duration".to_string()))?;

    Ok(RouteLeg {
        distance_m,
        duration_s,
        raw: Some(route.clone()),
    })
}

#[derive(Deserialize)]
struct TableBody {
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    durations: Option<Vec<Vec<Option<f64>>>>,
}

/// One row per origin, each with a single column for the shared destination.
pub fn parse_table(body: Value, expected: usize) -> Result<Vec<Option<RouteLeg>>, RoutingError> {
    check_status(&body)?;

    let table: TableBody =
        serde_json::from_value(body).map_err(|err| RoutingError::Malformed(err.to_string()))?;

    let distances = table
        .distances
        .ok_or_else(|| RoutingError::Malformed("table has no distances".to_string()))?;
    let durations = table
        .durations
        .ok_or_else(|| RoutingError::Malformed("table has no durations".to_string()))?;

    if distances.len() != expected || durations.len() != expected {
        return Err(RoutingError::Malformed(format!(
            "expected {expected} table rows, got {}",
            distances.len()
        )));
    }

    distances
        .into_iter()
        .zip(durations)
        .map(|(distance_row, duration_row)| {
            if distance_row.len() != 1 || duration_row.len() != 1 {
                return Err(RoutingError::Malformed(format!(
                    "expected 1 table column, got {}",
                    distance_row.len()
                )));
            }
            Ok(match (distance_row[0], duration_row[0]) {
                (Some(distance_m), Some(duration_s)) => Some(RouteLeg::new(distance_m, duration_s)),
                _ => None,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{parse_route, parse_table, OsrmClient, RoutingError, RoutingService};
    use crate::models::warehouse::GeoPoint;

    fn origin() -> GeoPoint {
        GeoPoint::new(12.9716, 77.5946)
    }

    fn destination() -> GeoPoint {
        GeoPoint::new(12.9352, 77.6245)
    }

    #[test]
    fn parses_first_route() {
        let leg = parse_route(json!({
            "code": "Ok",
            "routes": [
                { "distance": 5230.4, "duration": 812.0 },
                { "distance": 9000.0, "duration": 1200.0 }
            ]
        }))
        .unwrap();

        assert_eq!(leg.distance_m, 5230.4);
        assert_eq!(leg.duration_s, 812.0);
        assert!(leg.raw.is_some());
    }

    #[test]
    fn non_ok_code_is_an_upstream_error() {
        let err = parse_route(json!({ "code": "NoRoute", "message": "Impossible route" }))
            .unwrap_err();
        assert!(matches!(err, RoutingError::Upstream { ref code, .. } if code == "NoRoute"));
    }

    #[test]
    fn empty_route_list_is_unroutable() {
        let err = parse_route(json!({ "code": "Ok", "routes": [] })).unwrap_err();
        assert!(matches!(err, RoutingError::Unroutable));
    }

    #[test]
    fn table_reads_one_row_per_origin_and_keeps_gaps() {
        let legs = parse_table(
            json!({
                "code": "Ok",
                "distances": [[1200.0], [null]],
                "durations": [[180.0], [null]]
            }),
            2,
        )
        .unwrap();

        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].as_ref().unwrap().distance_m, 1200.0);
        assert!(legs[1].is_none());
    }

    #[test]
    fn table_with_wrong_shape_is_malformed() {
        let short = parse_table(
            json!({
                "code": "Ok",
                "distances": [[1200.0]],
                "durations": [[180.0]]
            }),
            2,
        )
        .unwrap_err();
        assert!(matches!(short, RoutingError::Malformed(_)));

        let wide = parse_table(
            json!({
                "code": "Ok",
                "distances": [[0.0, 1200.0]],
                "durations": [[0.0, 180.0]]
            }),
            1,
        )
        .unwrap_err();
        assert!(matches!(wide, RoutingError::Malformed(_)));
    }

    #[tokio::test]
    async fn osrm_client_fetches_route() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/route/v1/driving/.+"))
            .and(query_param("overview", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "Ok",
                "routes": [{ "distance": 6400.0, "duration": 900.0 }]
            })))
            .mount(&server)
            .await;

        let client = OsrmClient::new(&server.uri(), "driving", Duration::from_secs(5)).unwrap();
        let leg = client.route(origin(), destination()).await.unwrap();

        assert_eq!(leg.distance_m, 6400.0);
        assert_eq!(leg.duration_s, 900.0);
    }

    #[tokio::test]
    async fn osrm_client_reports_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = OsrmClient::new(&server.uri(), "driving", Duration::from_secs(5)).unwrap();
        let err = client.route(origin(), destination()).await.unwrap_err();

        assert!(matches!(err, RoutingError::Status(503)));
    }

    #[tokio::test]
    async fn osrm_client_times_out_on_slow_backend() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "code": "Ok", "routes": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client =
            OsrmClient::new(&server.uri(), "driving", Duration::from_millis(50)).unwrap();
        let err = client.route(origin(), destination()).await.unwrap_err();

        assert!(matches!(err, RoutingError::Timeout(_)));
    }

    #[tokio::test]
    async fn osrm_client_fetches_table_towards_destination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/table/v1/driving/.+"))
            .and(query_param("sources", "0;1"))
            .and(query_param("destinations", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "code": "Ok",
                "distances": [[2500.0], [7100.0]],
                "durations": [[300.0], [840.0]]
            })))
            .mount(&server)
            .await;

        let client = OsrmClient::new(&server.uri(), "driving", Duration::from_secs(5)).unwrap();
        let legs = client
            .table(&[destination(), GeoPoint::new(13.0, 77.7)], origin())
            .await
            .unwrap();

        assert_eq!(legs.len(), 2);
        assert_eq!(legs[1].as_ref().unwrap().duration_s, 840.0);
    }
}
