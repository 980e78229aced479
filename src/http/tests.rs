use std::future::Future;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpListener};
use std::thread;

use tokio::sync::mpsc;

use super::*;
use crate::args::HttpMethod;
use crate::args::test_support::parse_test_args;
use crate::error::{AppError, AppResult};
use crate::metrics::{ChannelRecorder, Observation};
use crate::script::{HttpCapability, RequestDescriptor};

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

/// Serves `connections` requests with `status`, then stops accepting.
fn spawn_status_server(status_line: &'static str, connections: usize) -> AppResult<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    thread::spawn(move || {
        for _ in 0..connections {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut buffer = [0u8; 2048];
            if stream.read(&mut buffer).is_err() {
                continue;
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\nOK",
                status_line
            );
            if stream.write_all(response.as_bytes()).is_err() {
                continue;
            }
            drop(stream.flush());
            drop(stream.shutdown(Shutdown::Both));
        }
    });
    Ok(format!("http://{}", addr))
}

fn closed_port_url() -> AppResult<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}/", addr))
}

fn descriptor(url: String, method: HttpMethod) -> RequestDescriptor {
    RequestDescriptor {
        url,
        method,
        headers: vec![("Content-Type".to_owned(), "application/json".to_owned())],
        body: None,
    }
}

#[test]
fn build_client_accepts_defaults() -> AppResult<()> {
    let args = parse_test_args(["stagerun"])?;
    build_client(&args)?;
    let args = parse_test_args(["stagerun", "--insecure", "--no-ua"])?;
    build_client(&args)?;
    Ok(())
}

#[test]
fn send_reports_status_and_sample() -> AppResult<()> {
    run_async_test(async {
        let url = spawn_status_server("503 Service Unavailable", 1)?;
        let args = parse_test_args(["stagerun"])?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let http = ReqwestHttp::new(build_client(&args)?, ChannelRecorder::new(tx));

        let response = http
            .send(&descriptor(format!("{}/headers", url), HttpMethod::Get))
            .await;
        if response.status != 503 {
            return Err(AppError::validation(format!(
                "Expected 503, got {}",
                response.status
            )));
        }
        match rx.try_recv() {
            Ok(Observation::Request(sample)) if sample.status == 503 && !sample.timed_out => Ok(()),
            other => Err(AppError::validation(format!(
                "Unexpected observation: {:?}",
                other
            ))),
        }
    })
}

#[test]
fn send_posts_body_and_passes_on_200() -> AppResult<()> {
    run_async_test(async {
        let url = spawn_status_server("200 OK", 1)?;
        let args = parse_test_args(["stagerun"])?;
        let (tx, _rx) = mpsc::unbounded_channel();
        let http = ReqwestHttp::new(build_client(&args)?, ChannelRecorder::new(tx));
        let mut request = descriptor(format!("{}/predict", url), HttpMethod::Post);
        request.body = Some("{\"inputs\":[],\"parameters\":{}}".to_owned());

        let response = http.send(&request).await;
        if !response.is_expected() {
            return Err(AppError::validation(format!(
                "Expected 200, got {}",
                response.status
            )));
        }
        Ok(())
    })
}

#[test]
fn send_maps_connection_failure_to_status_zero() -> AppResult<()> {
    run_async_test(async {
        let url = closed_port_url()?;
        let args = parse_test_args(["stagerun", "--connect-timeout", "2s"])?;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let http = ReqwestHttp::new(build_client(&args)?, ChannelRecorder::new(tx));

        let response = http.send(&descriptor(url, HttpMethod::Get)).await;
        if response.status != 0 {
            return Err(AppError::validation(format!(
                "Expected status 0, got {}",
                response.status
            )));
        }
        match rx.try_recv() {
            Ok(Observation::Request(sample)) if sample.is_failure() => Ok(()),
            other => Err(AppError::validation(format!(
                "Unexpected observation: {:?}",
                other
            ))),
        }
    })
}
