//! Tests for retry policy and Retry-After parsing.

use super::*;
use chrono::TimeZone;

mod retry_after {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap()
    }

    #[test]
    fn test_seconds() {
        assert_eq!(parse_retry_after("120", now()), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 5 ", now()), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_http_date_in_future() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:29:30 GMT", now()),
            Some(Duration::from_secs(90))
        );
    }

    #[test]
    fn test_http_date_in_past_is_zero() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:00:00 GMT", now()),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_garbage() {
        assert_eq!(parse_retry_after("soon", now()), None);
        assert_eq!(parse_retry_after("-1", now()), None);
    }
}

mod retry_policy {
    use super::*;

    /// Verify that RetryPolicy::default() has expected values.
    #[test]
    fn test_default() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert_eq!(policy.backoff_multiplier, 2.0);
        assert!(policy.use_jitter);
    }

    #[test]
    fn test_exponential_backoff_without_jitter() {
        let policy = RetryPolicy::default().without_jitter();

        assert_eq!(policy.calculate_delay(0), Duration::ZERO);
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(5)).without_jitter();

        assert_eq!(policy.calculate_delay(4), Duration::from_secs(5));
        assert_eq!(policy.calculate_delay(9), Duration::from_secs(5));
    }

    /// Jitter stays within ±25% of the base delay.
    #[test]
    fn test_jitter_bounds() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000), Duration::from_secs(60)).with_jitter();

        for _ in 0..100 {
            let delay = policy.calculate_delay(1);
            assert!(delay >= Duration::from_millis(750), "delay too short: {:?}", delay);
            assert!(delay <= Duration::from_millis(1250), "delay too long: {:?}", delay);
        }
    }

    #[test]
    fn test_server_hint_wins_but_is_capped() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(10)).without_jitter();

        assert_eq!(policy.delay_for(1, Some(Duration::from_secs(3))), Duration::from_secs(3));
        assert_eq!(policy.delay_for(1, Some(Duration::from_secs(30))), Duration::from_secs(10));
        assert_eq!(policy.delay_for(2, None), Duration::from_millis(200));
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(10));

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
    }
}
