use std::future::Future;

use super::test_support::{MemoryRecorder, Recorded, ScriptedHttp};
use super::*;

fn run_async_test<F>(future: F) -> AppResult<()>
where
    F: Future<Output = AppResult<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::validation(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(future)
}

fn headers_urls() -> Vec<String> {
    vec![
        "http://one.test/headers".to_owned(),
        "http://two.test/headers".to_owned(),
        "http://three.test/headers".to_owned(),
    ]
}

fn check(passed: bool) -> Recorded {
    Recorded::Check(STATUS_CHECK.to_owned(), passed)
}

fn rate(idx: usize, value: bool) -> Recorded {
    Recorded::Rate(format!("failed_requests_{}", idx), value)
}

#[test]
fn predict_records_passing_check_on_200() -> AppResult<()> {
    run_async_test(async {
        let script = PredictScript::new("http://predict.test/predict".to_owned())?;
        let http = ScriptedHttp::new([200], 200);
        let recorder = MemoryRecorder::default();

        script.iterate(&http, &recorder).await;

        if recorder.entries() != vec![check(true)] {
            return Err(AppError::validation(format!(
                "Unexpected observations: {:?}",
                recorder.entries()
            )));
        }
        Ok(())
    })
}

#[test]
fn predict_records_failing_check_on_500() -> AppResult<()> {
    run_async_test(async {
        let script = PredictScript::new("http://predict.test/predict".to_owned())?;
        let http = ScriptedHttp::new([500], 200);
        let recorder = MemoryRecorder::default();

        script.iterate(&http, &recorder).await;

        if recorder.entries() != vec![check(false)] {
            return Err(AppError::validation(format!(
                "Unexpected observations: {:?}",
                recorder.entries()
            )));
        }
        Ok(())
    })
}

#[test]
fn predict_treats_transport_failure_as_failed_check() -> AppResult<()> {
    run_async_test(async {
        let script = PredictScript::new("http://predict.test/predict".to_owned())?;
        let http = ScriptedHttp::new([HttpResponse::TRANSPORT_FAILURE.status], 200);
        let recorder = MemoryRecorder::default();

        script.iterate(&http, &recorder).await;

        if recorder.entries() != vec![check(false)] {
            return Err(AppError::validation("Expected a failed check"));
        }
        Ok(())
    })
}

#[test]
fn predict_only_accepts_exactly_200() -> AppResult<()> {
    run_async_test(async {
        let script = PredictScript::new("http://predict.test/predict".to_owned())?;
        for status in [199, 201, 204, 301, 404, 503] {
            let http = ScriptedHttp::new([status], 200);
            let recorder = MemoryRecorder::default();
            script.iterate(&http, &recorder).await;
            if recorder.entries() != vec![check(false)] {
                return Err(AppError::validation(format!(
                    "Status {} should fail the check",
                    status
                )));
            }
        }
        Ok(())
    })
}

#[test]
fn predict_posts_json_payload() -> AppResult<()> {
    run_async_test(async {
        let script = PredictScript::new("http://predict.test/predict".to_owned())?;
        let http = ScriptedHttp::new([], 200);
        let recorder = MemoryRecorder::default();

        script.iterate(&http, &recorder).await;

        let seen = http.seen();
        let request = seen
            .first()
            .ok_or_else(|| AppError::validation("Expected one request"))?;
        if request.method != HttpMethod::Post || request.url != "http://predict.test/predict" {
            return Err(AppError::validation("Unexpected method or url"));
        }
        if request.headers
            != vec![("Content-Type".to_owned(), "application/json".to_owned())]
        {
            return Err(AppError::validation("Unexpected headers"));
        }
        let body = request
            .body
            .as_deref()
            .ok_or_else(|| AppError::validation("Expected a body"))?;
        let parsed: serde_json::Value = serde_json::from_str(body)
            .map_err(|err| AppError::validation(format!("Body is not JSON: {}", err)))?;
        let expected = serde_json::json!({
            "inputs": ["I am happy", "I am angry", "I am sad"],
            "parameters": {},
        });
        if parsed != expected {
            return Err(AppError::validation(format!("Unexpected body: {}", body)));
        }
        Ok(())
    })
}

#[test]
fn headers_tracks_each_endpoint_independently() -> AppResult<()> {
    run_async_test(async {
        let script = HeadersScript::new(headers_urls())?;
        let http = ScriptedHttp::new([200, 503, 200], 200);
        let recorder = MemoryRecorder::default();

        script.iterate(&http, &recorder).await;

        let expected = vec![
            check(true),
            rate(1, false),
            check(false),
            rate(2, true),
            check(true),
            rate(3, false),
        ];
        if recorder.entries() != expected {
            return Err(AppError::validation(format!(
                "Unexpected observations: {:?}",
                recorder.entries()
            )));
        }
        Ok(())
    })
}

#[test]
fn headers_calls_endpoints_in_order_with_get() -> AppResult<()> {
    run_async_test(async {
        let script = HeadersScript::new(headers_urls())?;
        let http = ScriptedHttp::new([], 200);
        let recorder = MemoryRecorder::default();

        script.iterate(&http, &recorder).await;

        let seen = http.seen();
        let urls: Vec<&str> = seen.iter().map(|request| request.url.as_str()).collect();
        if urls != ["http://one.test/headers", "http://two.test/headers", "http://three.test/headers"]
        {
            return Err(AppError::validation(format!("Unexpected order: {:?}", urls)));
        }
        if seen
            .iter()
            .any(|request| request.method != HttpMethod::Get || request.body.is_some())
        {
            return Err(AppError::validation("Expected bodiless GET requests"));
        }
        Ok(())
    })
}

#[test]
fn headers_requires_three_urls() -> AppResult<()> {
    if HeadersScript::new(vec!["http://one.test/headers".to_owned()]).is_ok() {
        return Err(AppError::validation("Expected URL count mismatch"));
    }
    Ok(())
}

#[test]
fn build_script_uses_defaults_and_overrides() -> AppResult<()> {
    let predict = build_script(ScriptKind::Predict, &[])?;
    if predict.kind() != ScriptKind::Predict || !predict.rate_metrics().is_empty() {
        return Err(AppError::validation("Unexpected predict script"));
    }
    let headers = build_script(ScriptKind::Headers, &headers_urls())?;
    if headers.rate_metrics()
        != vec![
            "failed_requests_1".to_owned(),
            "failed_requests_2".to_owned(),
            "failed_requests_3".to_owned(),
        ]
    {
        return Err(AppError::validation("Unexpected rate metric names"));
    }
    if build_script(ScriptKind::Predict, &headers_urls()).is_ok() {
        return Err(AppError::validation("Predict must reject three URLs"));
    }
    if build_script(ScriptKind::Predict, &["ftp://files.test/x".to_owned()]).is_ok() {
        return Err(AppError::validation("Expected unsupported scheme error"));
    }
    if build_script(ScriptKind::Predict, &["not a url".to_owned()]).is_ok() {
        return Err(AppError::validation("Expected invalid URL error"));
    }
    Ok(())
}
