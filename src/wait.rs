// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Bounded polling after create, update and delete.

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::jsonpath::JsonPath;
use kube::api::{Api, DynamicObject};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info, instrument, warn};

/// Wait until `jsonpath` renders to `value` on the applied object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaitCondition {
    pub jsonpath: String,
    pub value: String,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<Duration>,
}

/// Wait until the object is gone after deletion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteWait {
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<Duration>,
}

/// Timeout and interval used when a wait block leaves them unset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitDefaults {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl From<&ProviderConfig> for WaitDefaults {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            timeout: config.wait_timeout,
            poll_interval: config.poll_interval,
        }
    }
}

/// Outcome of one check made by [`poll_until`]
#[derive(Debug)]
pub enum Check<T> {
    Done(T),
    /// Not there yet; carries what was observed
    Pending(String),
    /// Nothing could be observed, the previous observation is kept
    Retry,
}

/// Returned by [`poll_until`] when the deadline passes
#[derive(Debug, Clone, PartialEq)]
pub struct Elapsed {
    /// Observation of the last completed check, empty if none completed
    pub last: String,
}

/// Run `check` immediately and then every `interval` until it is done or
/// `timeout` has passed. A check still running at the deadline is abandoned.
pub async fn poll_until<T, F, Fut>(
    timeout: Duration,
    interval: Duration,
    mut check: F,
) -> std::result::Result<T, Elapsed>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Check<T>>,
{
    let deadline = Instant::now() + timeout;
    let mut last = String::new();

    loop {
        match timeout_at(deadline, check()).await {
            Ok(Check::Done(value)) => return Ok(value),
            Ok(Check::Pending(observed)) => last = observed,
            Ok(Check::Retry) => {}
            Err(_) => return Err(Elapsed { last }),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(Elapsed { last });
        }
        sleep(interval.min(deadline - now)).await;
    }
}

/// Wait for every condition in order, each with its own timeout.
#[instrument(skip(api, object, conditions, defaults), fields(object = %object))]
pub async fn wait_for_upsert(
    api: &Api<DynamicObject>,
    name: &str,
    object: &str,
    conditions: &[WaitCondition],
    defaults: &WaitDefaults,
) -> Result<()> {
    for condition in conditions {
        let path = JsonPath::parse(&condition.jsonpath)?;
        let timeout = condition.timeout.unwrap_or(defaults.timeout);
        let interval = condition.poll_interval.unwrap_or(defaults.poll_interval);
        let expected = condition.value.as_str();
        let path = &path;

        info!(
            "Waiting up to {:?} for {} to equal '{}'",
            timeout, condition.jsonpath, expected
        );

        let outcome = poll_until(timeout, interval, move || async move {
            match api.get_opt(name).await {
                Ok(Some(obj)) => match serde_json::to_value(&obj) {
                    Ok(json) => {
                        let rendered = path.render(&json);
                        if rendered == expected {
                            Check::Done(())
                        } else {
                            debug!("{} is '{}', expecting '{}'", path, rendered, expected);
                            Check::Pending(rendered)
                        }
                    }
                    Err(e) => Check::Pending(e.to_string()),
                },
                Ok(None) => {
                    debug!("{} not found yet", name);
                    Check::Retry
                }
                Err(e) => {
                    warn!("Error reading {} while waiting: {}", name, e);
                    Check::Retry
                }
            }
        })
        .await;

        match outcome {
            Ok(()) => info!("Condition {} = '{}' met", condition.jsonpath, expected),
            Err(Elapsed { last }) => {
                return Err(ProviderError::WaitTimeout {
                    object: object.to_string(),
                    jsonpath: condition.jsonpath.clone(),
                    expected: condition.value.clone(),
                    last,
                    timeout,
                })
            }
        }
    }

    Ok(())
}

/// Wait until reading the object returns 404.
#[instrument(skip(api, object, wait, defaults), fields(object = %object))]
pub async fn wait_for_delete(
    api: &Api<DynamicObject>,
    name: &str,
    object: &str,
    wait: &DeleteWait,
    defaults: &WaitDefaults,
) -> Result<()> {
    let timeout = wait.timeout.unwrap_or(defaults.timeout);
    let interval = wait.poll_interval.unwrap_or(defaults.poll_interval);

    info!("Waiting up to {:?} for {} to be deleted", timeout, object);

    let outcome = poll_until(timeout, interval, move || async move {
        match api.get_opt(name).await {
            Ok(None) => Check::Done(()),
            Ok(Some(_)) => Check::Pending("still present".to_string()),
            Err(e) => {
                warn!("Error reading {} while waiting for deletion: {}", name, e);
                Check::Pending(e.to_string())
            }
        }
    })
    .await;

    match outcome {
        Ok(()) => {
            info!("{} deleted", object);
            Ok(())
        }
        Err(_) => Err(ProviderError::DeleteTimeout {
            object: object.to_string(),
            timeout,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{not_found_json, object_json, server_error_json, MockService};
    use kube::discovery::ApiResource;
    use kube::core::GroupVersionKind;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const PATH: &str = "/apis/acme.cert-manager.io/v1/namespaces/default/challenges/web-1";

    fn fast() -> WaitDefaults {
        WaitDefaults {
            timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
        }
    }

    fn challenges(mock: MockService) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk("acme.cert-manager.io", "v1", "Challenge");
        let ar = ApiResource::from_gvk_with_plural(&gvk, "challenges");
        Api::namespaced_with(mock.into_client(), "default", &ar)
    }

    fn challenge(state: &str) -> String {
        object_json(
            "acme.cert-manager.io/v1",
            "Challenge",
            Some("default"),
            "web-1",
            json!({"type": "HTTP-01"}),
            Some(json!({"state": state, "processing": state != "valid"})),
        )
    }

    fn condition(value: &str) -> WaitCondition {
        WaitCondition {
            jsonpath: ".status.state".to_string(),
            value: value.to_string(),
            timeout: None,
            poll_interval: None,
        }
    }

    #[tokio::test]
    async fn test_poll_until_checks_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = poll_until(Duration::from_secs(5), Duration::from_secs(5), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Check::Done(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_poll_until_retries_until_done() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = poll_until(Duration::from_secs(5), Duration::from_millis(5), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n == 3 {
                    Check::Done(n)
                } else {
                    Check::Pending(format!("attempt {n}"))
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
    }

    #[tokio::test]
    async fn test_poll_until_reports_last_observation_on_timeout() {
        let result: std::result::Result<(), Elapsed> =
            poll_until(Duration::from_millis(50), Duration::from_millis(10), || async {
                Check::Pending("pending".to_string())
            })
            .await;

        assert_eq!(
            result,
            Err(Elapsed {
                last: "pending".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_poll_until_abandons_hanging_check() {
        let result: std::result::Result<(), Elapsed> =
            poll_until(Duration::from_millis(50), Duration::from_millis(10), || async {
                sleep(Duration::from_secs(60)).await;
                Check::Done(())
            })
            .await;

        assert_eq!(result, Err(Elapsed { last: String::new() }));
    }

    #[tokio::test]
    async fn test_wait_for_upsert_succeeds_once_value_matches() {
        let mock = MockService::new()
            .on_get(PATH, 200, &challenge("pending"))
            .on_get(PATH, 200, &challenge("pending"))
            .on_get(PATH, 200, &challenge("valid"));
        let api = challenges(mock.clone());

        wait_for_upsert(&api, "web-1", "Challenge default/web-1", &[condition("valid")], &fast())
            .await
            .unwrap();

        assert_eq!(mock.requests_with_method("GET").len(), 3);
    }

    #[tokio::test]
    async fn test_wait_for_upsert_tolerates_not_found_while_waiting() {
        let mock = MockService::new()
            .on_get(PATH, 404, &not_found_json("challenges", "web-1"))
            .on_get(PATH, 200, &challenge("valid"));
        let api = challenges(mock);

        wait_for_upsert(&api, "web-1", "Challenge default/web-1", &[condition("valid")], &fast())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_upsert_retries_after_server_errors() {
        let mock = MockService::new()
            .on_get(PATH, 500, &server_error_json(500, "InternalError"))
            .on_get(PATH, 503, &server_error_json(503, "ServiceUnavailable"))
            .on_get(PATH, 200, &challenge("valid"));
        let api = challenges(mock.clone());

        wait_for_upsert(&api, "web-1", "Challenge default/web-1", &[condition("valid")], &fast())
            .await
            .unwrap();

        assert_eq!(mock.requests_with_method("GET").len(), 3);
    }

    #[tokio::test]
    async fn test_wait_for_upsert_timeout_keeps_value_seen_before_errors() {
        let mock = MockService::new()
            .on_get(PATH, 200, &challenge("pending"))
            .on_get(PATH, 404, &not_found_json("challenges", "web-1"));
        let api = challenges(mock);
        let mut cond = condition("valid");
        cond.timeout = Some(Duration::from_millis(60));

        let err = wait_for_upsert(&api, "web-1", "Challenge default/web-1", &[cond], &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::WaitTimeout { ref last, .. } if last == "pending"));
    }

    #[tokio::test]
    async fn test_poll_until_retry_keeps_previous_observation() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result: std::result::Result<(), Elapsed> =
            poll_until(Duration::from_millis(50), Duration::from_millis(5), move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Check::Pending("seen".to_string())
                    } else {
                        Check::Retry
                    }
                }
            })
            .await;

        assert_eq!(result, Err(Elapsed { last: "seen".to_string() }));
        assert!(calls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_wait_for_upsert_times_out_with_last_value() {
        let mock = MockService::new().on_get(PATH, 200, &challenge("pending"));
        let api = challenges(mock);
        let mut cond = condition("valid");
        cond.timeout = Some(Duration::from_millis(60));

        let err = wait_for_upsert(&api, "web-1", "Challenge default/web-1", &[cond], &fast())
            .await
            .unwrap_err();

        match err {
            ProviderError::WaitTimeout {
                jsonpath,
                expected,
                last,
                timeout,
                ..
            } => {
                assert_eq!(jsonpath, ".status.state");
                assert_eq!(expected, "valid");
                assert_eq!(last, "pending");
                assert_eq!(timeout, Duration::from_millis(60));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_wait_for_upsert_checks_conditions_in_order() {
        let mock = MockService::new().on_get(PATH, 200, &challenge("valid"));
        let api = challenges(mock.clone());
        let processing = WaitCondition {
            jsonpath: "{.status.processing}".to_string(),
            value: "false".to_string(),
            timeout: None,
            poll_interval: None,
        };

        wait_for_upsert(
            &api,
            "web-1",
            "Challenge default/web-1",
            &[condition("valid"), processing],
            &fast(),
        )
        .await
        .unwrap();

        assert_eq!(mock.requests_with_method("GET").len(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_upsert_rejects_invalid_jsonpath() {
        let api = challenges(MockService::new());
        let mut cond = condition("valid");
        cond.jsonpath = "{.status".to_string();

        let err = wait_for_upsert(&api, "web-1", "Challenge default/web-1", &[cond], &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::JsonPathError { .. }));
    }

    #[tokio::test]
    async fn test_wait_for_delete_until_not_found() {
        let mock = MockService::new()
            .on_get(PATH, 200, &challenge("valid"))
            .on_get(PATH, 404, &not_found_json("challenges", "web-1"));
        let api = challenges(mock.clone());

        wait_for_delete(&api, "web-1", "Challenge default/web-1", &DeleteWait::default(), &fast())
            .await
            .unwrap();

        assert_eq!(mock.requests_with_method("GET").len(), 2);
    }

    #[tokio::test]
    async fn test_wait_for_delete_times_out() {
        let mock = MockService::new().on_get(PATH, 200, &challenge("valid"));
        let api = challenges(mock);
        let wait = DeleteWait {
            timeout: Some(Duration::from_millis(50)),
            poll_interval: Some(Duration::from_millis(10)),
        };

        let err = wait_for_delete(&api, "web-1", "Challenge default/web-1", &wait, &fast())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::DeleteTimeout { .. }));
    }

    #[test]
    fn test_wait_condition_durations_are_human_readable() {
        let cond: WaitCondition = serde_json::from_value(json!({
            "jsonpath": ".status.state",
            "value": "valid",
            "timeout": "2m",
            "poll_interval": "250ms"
        }))
        .unwrap();

        assert_eq!(cond.timeout, Some(Duration::from_secs(120)));
        assert_eq!(cond.poll_interval, Some(Duration::from_millis(250)));
        assert_eq!(serde_json::to_value(&cond).unwrap()["timeout"], "2m");
    }

    #[test]
    fn test_wait_condition_rejects_unknown_fields() {
        let result: std::result::Result<WaitCondition, _> = serde_json::from_value(json!({
            "jsonpath": ".status.state",
            "value": "valid",
            "interval": "1s"
        }));
        assert!(result.is_err());
    }
}
