//! HTTP contract tests for the OpenWeather provider against a mock server.

use weather_core::{
    ClockZone, Config, Coordinates, FetchError, FetchErrorKind, HOURLY_SAMPLE_LIMIT, Session,
    Units, UpstreamKind, WeatherProvider, provider::openweather::OpenWeatherProvider,
};
use std::sync::Arc;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param, query_param_is_missing},
};

const API_KEY: &str = "TEST_KEY";

fn current_weather_body(name: &str, lat: f64, lon: f64) -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": lon, "lat": lat },
        "weather": [
            { "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }
        ],
        "base": "stations",
        "main": {
            "temp": 288.71,
            "feels_like": 288.1,
            "temp_min": 287.6,
            "temp_max": 289.8,
            "pressure": 1016,
            "humidity": 68
        },
        "visibility": 10000,
        "wind": { "speed": 4.12, "deg": 250 },
        "clouds": { "all": 75 },
        "dt": 1_700_000_000,
        "sys": { "country": "FR", "sunrise": 1_699_944_000, "sunset": 1_699_978_000 },
        "timezone": 3600,
        "id": 2_988_507,
        "name": name,
        "cod": 200
    })
}

fn onecall_body(hours: i64) -> serde_json::Value {
    let hourly: Vec<_> = (0..hours)
        .map(|i| {
            serde_json::json!({
                "dt": 1_699_999_200 + i * 3600,
                "temp": 280.0 + i as f64,
                "feels_like": 278.0,
                "humidity": 80,
                "weather": [
                    { "id": 500, "main": "Rain", "description": "light rain", "icon": format!("h{i}") }
                ],
                "pop": 0.4
            })
        })
        .collect();

    serde_json::json!({
        "lat": 48.8566,
        "lon": 2.3522,
        "timezone": "Europe/Paris",
        "timezone_offset": 3600,
        "hourly": hourly
    })
}

fn config(server: &MockServer) -> Config {
    Config {
        api_key: Some(API_KEY.to_string()),
        api_base: server.uri(),
        timeout_secs: 5,
        clock: ClockZone::Location,
        ..Config::default()
    }
}

fn provider(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::from_config(&config(server)).expect("Failed to create provider")
}

// ============================================================================
// Current weather
// ============================================================================

#[tokio::test]
async fn current_weather_maps_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Paris"))
        .and(query_param("appid", API_KEY))
        .and(query_param_is_missing("units"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(current_weather_body("Paris", 48.8566, 2.3522)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = provider(&server)
        .fetch_current_weather("Paris")
        .await
        .expect("should succeed");

    assert_eq!(snapshot.location_name, "Paris");
    assert_eq!(snapshot.coordinates.latitude, 48.8566);
    assert_eq!(snapshot.coordinates.longitude, 2.3522);
    assert_eq!(snapshot.captured_at, 1_700_000_000);
    assert_eq!(snapshot.description, "broken clouds");
    assert_eq!(snapshot.icon_code, "04d");
    assert_eq!(snapshot.timezone_offset_seconds, 3600);
    assert!((snapshot.temperature - 288.71).abs() < f64::EPSILON);
    assert!(snapshot.alerts.is_none());
}

#[tokio::test]
async fn configured_units_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("units", "metric"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(current_weather_body("Paris", 48.8566, 2.3522)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cfg = Config {
        units: Some(Units::Metric),
        ..config(&server)
    };
    let provider = OpenWeatherProvider::from_config(&cfg).expect("provider");

    assert!(provider.fetch_current_weather("Paris").await.is_ok());
}

#[tokio::test]
async fn alerts_are_kept_when_present() {
    let server = MockServer::start().await;

    let mut body = current_weather_body("Miami", 25.7617, -80.1918);
    body["alerts"] = serde_json::json!([
        { "sender_name": "NWS", "event": "Hurricane Warning", "description": "Hurricane conditions expected." }
    ]);

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let snapshot = provider(&server)
        .fetch_current_weather("Miami")
        .await
        .expect("should succeed");

    assert_eq!(
        snapshot.first_alert().map(|a| a.description.as_str()),
        Some("Hurricane conditions expected.")
    );
}

#[tokio::test]
async fn unknown_city_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Nonexistentville123"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({ "cod": "404", "message": "city not found" })),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .fetch_current_weather("Nonexistentville123")
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FetchErrorKind::UpstreamError(UpstreamKind::NotFound));
    assert!(err.to_string().contains("city not found"));
}

#[tokio::test]
async fn empty_city_is_invalid_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", ""))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "cod": "400", "message": "Nothing to geocode" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = provider(&server).fetch_current_weather("").await.unwrap_err();
    assert_eq!(
        err.kind(),
        FetchErrorKind::UpstreamError(UpstreamKind::InvalidRequest)
    );
}

#[tokio::test]
async fn bad_key_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = provider(&server).fetch_current_weather("Paris").await.unwrap_err();
    assert_eq!(
        err.kind(),
        FetchErrorKind::UpstreamError(UpstreamKind::Unauthorized)
    );
}

#[tokio::test]
async fn server_error_is_upstream_other() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = provider(&server).fetch_current_weather("Paris").await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Upstream {
            status: 503,
            kind: UpstreamKind::Other,
            ..
        }
    ));
}

#[tokio::test]
async fn invalid_json_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = provider(&server).fetch_current_weather("Paris").await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::MalformedResponse);
}

#[tokio::test]
async fn missing_fields_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "Paris" })),
        )
        .mount(&server)
        .await;

    let err = provider(&server).fetch_current_weather("Paris").await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::MalformedResponse);
}

#[tokio::test]
async fn unreachable_server_is_network_failure() {
    let cfg = Config {
        api_key: Some(API_KEY.to_string()),
        // Nothing listens on port 1.
        api_base: "http://127.0.0.1:1".to_string(),
        timeout_secs: 5,
        ..Config::default()
    };

    let provider = OpenWeatherProvider::from_config(&cfg).expect("provider");
    let err = provider.fetch_current_weather("Paris").await.unwrap_err();
    assert_eq!(err.kind(), FetchErrorKind::NetworkFailure);
}

#[tokio::test]
async fn repeated_calls_are_fresh_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(current_weather_body("Paris", 48.8566, 2.3522)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server);
    assert!(provider.fetch_current_weather("Paris").await.is_ok());
    assert!(provider.fetch_current_weather("Paris").await.is_ok());
}

// ============================================================================
// Hourly forecast
// ============================================================================

#[tokio::test]
async fn forecast_request_shape_and_truncation() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/onecall"))
        .and(query_param("lat", "48.8566"))
        .and(query_param("lon", "2.3522"))
        .and(query_param("exclude", "current,minutely,daily,alerts"))
        .and(query_param("appid", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(onecall_body(10)))
        .expect(1)
        .mount(&server)
        .await;

    let samples = provider(&server)
        .fetch_hourly_forecast(Coordinates {
            latitude: 48.8566,
            longitude: 2.3522,
        })
        .await
        .expect("should succeed");

    assert_eq!(samples.len(), HOURLY_SAMPLE_LIMIT);
    for (i, sample) in samples.iter().enumerate() {
        assert_eq!(sample.icon_code, format!("h{i}"));
        assert!((sample.temperature - (280.0 + i as f64)).abs() < f64::EPSILON);
    }

    // 1_699_999_200 is 22:00 UTC; the payload offset is +01:00.
    assert_eq!(samples[0].formatted_time, "23:00");
    assert_eq!(samples[1].formatted_time, "00:00");
}

#[tokio::test]
async fn forecast_error_status_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/onecall"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .fetch_hourly_forecast(Coordinates {
            latitude: 48.8566,
            longitude: 2.3522,
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.kind(),
        FetchErrorKind::UpstreamError(UpstreamKind::Unauthorized)
    );
}

#[tokio::test]
async fn forecast_without_hourly_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/onecall"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "lat": 1.0, "lon": 2.0 })),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .fetch_hourly_forecast(Coordinates {
            latitude: 1.0,
            longitude: 2.0,
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FetchErrorKind::MalformedResponse);
}

// ============================================================================
// End to end through a session
// ============================================================================

#[tokio::test]
async fn session_search_fills_model_from_both_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(current_weather_body("Paris", 48.8566, 2.3522)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/onecall"))
        .and(query_param("lat", "48.8566"))
        .respond_with(ResponseTemplate::new(200).set_body_json(onecall_body(12)))
        .mount(&server)
        .await;

    let provider: Arc<dyn WeatherProvider> = Arc::new(provider(&server));
    let mut session = Session::new(provider);
    let model = session.search("Paris").await;

    assert_eq!(model.snapshot().map(|s| s.location_name.as_str()), Some("Paris"));
    assert_eq!(model.forecast().len(), HOURLY_SAMPLE_LIMIT);
    assert!(model.map_marker().is_some());
}

#[tokio::test]
async fn session_forecast_failure_keeps_current_weather() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(current_weather_body("Paris", 48.8566, 2.3522)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/onecall"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let provider: Arc<dyn WeatherProvider> = Arc::new(provider(&server));
    let mut session = Session::new(provider);
    let model = session.search("Paris").await;

    assert!(model.snapshot().is_some());
    assert!(model.forecast().is_empty());
    assert!(model.ui().map_visible);
}
