use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use phish_relay::*;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORWARDED: &[u8] = b"From: Alice <alice@example.com>\r\n\
                           To: submit@relay.example\r\n\
                           Subject: Re: Fwd: Invoice\r\n\
                           \r\n\
                           -----Forwarded message-----\n\
                           From: billing@evil.example\n\
                           Subject: Pay now\n\
                           Date: Mon, 1 Jan 2024\n\
                           \n\
                           Click http://evil.example/pay?id=1 now!";

fn test_config(base_url: &str) -> Config {
    Config {
        retry_base_delay: Duration::from_millis(10),
        ..Config::with_base_url(base_url)
    }
}

// --- Config ---

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.max_email_size_bytes(), 10 * 1024 * 1024);
    assert_eq!(config.rate_limit_per_hour, 10);
    assert_eq!(config.max_retries, 2);
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_huge_size_saturates() {
    let config = Config {
        max_email_size_mb: u64::MAX,
        ..Config::default()
    };

    assert_eq!(config.max_email_size_bytes(), u64::MAX);
    assert!(config.validate().is_ok());

    let config = Config {
        max_email_size_mb: u64::MAX / 1024,
        ..test_config("http://127.0.0.1:9")
    };
    let intake = Intake::new(config).unwrap();
    let result = tokio_test::block_on(intake.handle("a@example.com", b""));
    assert!(matches!(result, Err(IntakeError::Decode(_))));
}

#[test]
fn test_config_endpoint() {
    let config = Config::with_base_url("http://localhost:8080/");

    assert_eq!(
        config.endpoint("/api/v1/health"),
        "http://localhost:8080/api/v1/health"
    );
}

#[test]
fn test_config_validation() {
    assert!(matches!(
        Config::with_base_url("not a url").validate(),
        Err(ConfigError::BaseUrl { .. })
    ));
    assert!(matches!(
        Config::with_base_url("ftp://files.example").validate(),
        Err(ConfigError::BaseUrl { .. })
    ));

    let config = Config {
        rate_limit_per_hour: 0,
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Zero("rate_limit_per_hour"))
    ));

    assert!(Intake::new(Config::with_base_url("not a url")).is_err());
}

// --- RateLimiter ---

#[test]
fn test_rate_limiter_window() {
    let limiter = RateLimiter::new(2);
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    assert!(!limiter.is_limited_at("a@example.com", t0));
    limiter.record_at("a@example.com", t0);
    assert!(!limiter.is_limited_at("a@example.com", t0));
    limiter.record_at("a@example.com", t0 + ChronoDuration::minutes(1));

    assert!(limiter.is_limited_at("a@example.com", t0 + ChronoDuration::minutes(30)));
    assert!(!limiter.is_limited_at("b@example.com", t0 + ChronoDuration::minutes(30)));
    assert!(limiter.is_limited_at("a@example.com", t0 + ChronoDuration::minutes(59)));
    // The first submission leaves the window after exactly one hour
    assert!(!limiter.is_limited_at("a@example.com", t0 + ChronoDuration::minutes(60)));
}

#[test]
fn test_rate_limiter_sender_key_normalized() {
    let limiter = RateLimiter::new(1);
    let now = Utc::now();

    limiter.record_at(" User@Example.COM ", now);

    assert!(limiter.is_limited_at("user@example.com", now));
}

#[test]
fn test_rate_limiter_sweeps_idle_senders() {
    let limiter = RateLimiter::new(5);
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    limiter.record_at("old@example.com", t0);
    limiter.record_at("recent@example.com", t0 + ChronoDuration::minutes(90));
    assert_eq!(limiter.tracked_senders(), 2);

    limiter.record_at("new@example.com", t0 + ChronoDuration::hours(3));
    assert_eq!(limiter.tracked_senders(), 2);
}

#[test]
fn test_rate_limiter_reserve_is_atomic() {
    let limiter = RateLimiter::new(3);
    let now = Utc::now();

    let granted = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|_| scope.spawn(|| limiter.try_reserve_at("busy@example.com", now)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|granted| *granted)
            .count()
    });

    assert_eq!(granted, 3);
    assert!(limiter.is_limited_at("busy@example.com", now));
}

#[test]
fn test_rate_limiter_release() {
    let limiter = RateLimiter::new(1);
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();

    assert!(limiter.try_reserve_at("a@example.com", t0));
    assert!(!limiter.try_reserve_at("a@example.com", t0 + ChronoDuration::minutes(1)));

    limiter.release_at("a@example.com", t0);
    assert_eq!(limiter.tracked_senders(), 0);
    assert!(limiter.try_reserve_at("A@example.com", t0 + ChronoDuration::minutes(2)));
}

// --- Intake ---

#[test]
fn test_intake_rejects_oversized() {
    let config = Config {
        max_email_size_mb: 1,
        ..test_config("http://127.0.0.1:9")
    };
    let intake = Intake::new(config).unwrap();
    let raw = vec![b'a'; 1024 * 1024 + 1];

    let result = tokio_test::block_on(intake.handle("a@example.com", &raw));

    assert!(matches!(
        result,
        Err(IntakeError::TooLarge {
            size: 1_048_577,
            max: 1_048_576
        })
    ));
}

#[test]
fn test_intake_rate_limited() {
    let config = Config {
        rate_limit_per_hour: 1,
        ..test_config("http://127.0.0.1:9")
    };
    let intake = Intake::new(config).unwrap();
    intake.limiter().record("a@example.com");

    let result = tokio_test::block_on(intake.handle("A@example.com", FORWARDED));

    assert!(matches!(result, Err(IntakeError::RateLimited { .. })));
}

#[test]
fn test_intake_undecodable() {
    let intake = Intake::new(test_config("http://127.0.0.1:9")).unwrap();

    let result = tokio_test::block_on(intake.handle("a@example.com", b""));

    assert!(matches!(result, Err(IntakeError::Decode(_))));
    assert_eq!(intake.limiter().tracked_senders(), 0);
}

#[tokio::test]
async fn test_intake_full_pipeline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/submissions"))
        .and(body_partial_json(json!({
            "type": "email",
            "metadata": {
                "from": "billing@evil.example",
                "subject": "Pay now",
                "urls": ["http://evil.example/pay?id=1"]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": {"submission_id": "sub_42", "status": "processing"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        rate_limit_per_hour: 1,
        ..test_config(&server.uri())
    };
    let intake = Intake::new(config).unwrap();

    let result = intake.handle("alice@example.com", FORWARDED).await.unwrap();
    assert!(result.success);
    assert_eq!(result.submission_id.as_deref(), Some("sub_42"));

    let second = intake.handle("alice@example.com", FORWARDED).await;
    assert!(matches!(second, Err(IntakeError::RateLimited { .. })));
}

#[tokio::test]
async fn test_intake_failed_submission_not_counted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let config = Config {
        rate_limit_per_hour: 1,
        max_retries: 0,
        ..test_config(&server.uri())
    };
    let intake = Intake::new(config).unwrap();

    let first = intake.handle("alice@example.com", FORWARDED).await.unwrap();
    assert!(!first.success);
    assert_eq!(first.error_code, Some(ErrorCode::Http(500)));

    let second = intake.handle("alice@example.com", FORWARDED).await.unwrap();
    assert!(!second.success);
    assert_eq!(intake.limiter().tracked_senders(), 0);
}

#[tokio::test]
async fn test_intake_concurrent_messages_respect_cap() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/submissions"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"success": true, "data": {"submission_id": "sub_c"}}))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let config = Config {
        rate_limit_per_hour: 2,
        ..test_config(&server.uri())
    };
    let intake = Intake::new(config).unwrap();

    let outcomes = handle_five(&intake).await;
    let accepted = outcomes
        .iter()
        .filter(|r| r.as_ref().is_ok_and(|r| r.success))
        .count();
    let limited = outcomes
        .iter()
        .filter(|r| matches!(r, Err(IntakeError::RateLimited { .. })))
        .count();

    assert_eq!(accepted, 2);
    assert_eq!(limited, 3);
}

async fn handle_five(intake: &Intake) -> Vec<std::result::Result<ProcessingResult, IntakeError>> {
    let (a, b, c, d, e) = tokio::join!(
        intake.handle("carol@example.com", FORWARDED),
        intake.handle("carol@example.com", FORWARDED),
        intake.handle("carol@example.com", FORWARDED),
        intake.handle("carol@example.com", FORWARDED),
        intake.handle("carol@example.com", FORWARDED),
    );
    vec![a, b, c, d, e]
}
