//! Integration tests for the command-driven agent.
//!
//! These tests validate that:
//! - every protocol command is dispatched and answered with a readable reply
//! - command errors are reported inline and do not end the session
//! - on natural exit the agent waits for non-daemon workers, then drains once
//! - a drain fired by a signal is awaited before `serve` returns

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use workerctl::{
    Agent, Controller, ControllerConfig, LineSource, Reply, ScriptSource, WorkError, WorkFn,
    WorkerSpec,
};

#[tokio::test]
async fn line_session_round_trip() {
    let ctl = Controller::builder(ControllerConfig::default()).build();
    let agent = Agent::new(Arc::clone(&ctl));
    let input: &[u8] = b"add:tick:true:20\nstop,ghost\nlist\nstop:tick\nlist\n";
    let mut out = Vec::new();

    let report = agent
        .serve(LineSource::new(input), &mut out)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.total(), 0);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("worker 'tick' started"));
    assert!(text.contains("error: worker 'ghost' not found"));
    assert!(text.contains("managed workers: 1"));
    assert!(text.contains("worker 'tick' stopped"));
    assert!(text.trim_end().ends_with("no managed workers"));
    ctl.close().await;
}

#[tokio::test]
async fn natural_exit_waits_for_non_daemon_workers() {
    let ctl = Controller::builder(ControllerConfig::default()).build();
    let agent = Agent::new(Arc::clone(&ctl));
    let input: &[u8] = b"create,nap,1\nadd:bg\n";

    let started = tokio::time::Instant::now();
    let report = agent
        .serve(LineSource::new(input), tokio::io::sink())
        .await
        .unwrap()
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(900));
    assert_eq!(report.stopped, vec!["bg"]);
    assert!(ctl.list().await.is_empty());
    assert!(agent.shutdown().is_registered());
    assert!(agent.shutdown().run("again").await.is_none());
}

#[tokio::test]
async fn handle_line_reports_parse_errors() {
    let agent = Agent::new(Arc::new(Controller::new(ControllerConfig::default())));

    let err = agent.handle_line("create,w,soon").await.unwrap_err();
    assert_eq!(err.as_label(), "invalid_argument");
    let err = agent.handle_line("add").await.unwrap_err();
    assert_eq!(err.as_label(), "missing_argument");

    let reply = agent.handle_line("stopall").await.unwrap();
    assert!(matches!(reply, Reply::Drained(ref r) if r.total() == 0));
}

#[tokio::test]
async fn serve_waits_for_drain_started_by_signal() {
    let cfg = ControllerConfig {
        drain_grace: Duration::from_millis(800),
        ..ControllerConfig::default()
    };
    let ctl = Controller::builder(cfg).build();
    let agent = Agent::new(Arc::clone(&ctl));

    ctl.create(WorkerSpec::fixed("n", Duration::from_secs(10)))
        .await
        .unwrap();
    let stubborn = WorkFn::arc(|_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok::<_, WorkError>(())
    });
    ctl.create(WorkerSpec::custom("s", stubborn).with_daemon(true))
        .await
        .unwrap();

    let shutdown = Arc::clone(agent.shutdown());
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.run("signal").await;
    });

    let started = tokio::time::Instant::now();
    let report = agent
        .serve(ScriptSource::default(), tokio::io::sink())
        .await
        .unwrap();

    assert!(report.is_none());
    assert!(started.elapsed() >= Duration::from_millis(700));
    assert!(ctl.list().await.is_empty());
}
