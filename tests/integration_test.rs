use iou::prelude::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type Request = Task<&'static str, String>;

fn recorder() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

fn transport(
    log: Arc<Mutex<Vec<String>>>,
) -> impl Executor<Payload = &'static str, Output = String> {
    executor_fn(move |task: &Request| -> std::result::Result<String, Failure<String>> {
        let line = *task.payload();
        log.lock().push(line.to_string());
        match line.strip_prefix("FAIL ") {
            Some(reason) => Err(Failure::new(reason.to_string()).with_partial("partial".into())),
            None => Ok(format!("OK {}", line)),
        }
    })
}

#[test]
fn test_settles_once() {
    let p: Promise<i32, String> = Promise::named("once");
    p.fulfill(1).unwrap();

    assert!(matches!(p.fulfill(2), Err(Error::AlreadySettled(name)) if name == "once"));
    assert!(p.reject("late".into()).unwrap_err().is_state_error());
    assert_eq!(p.wait(), Ok(1));
}

#[test]
fn test_handlers_before_and_after_settlement_agree() {
    let order = recorder();
    let p: Promise<i32, String> = Promise::new();

    let early = {
        let order = Arc::clone(&order);
        p.on_fulfilled(Handler::map(move |v: i32| {
            order.lock().push(format!("early {}", v));
            v + 1
        }))
    };
    p.fulfill(10).unwrap();
    let late = {
        let order = Arc::clone(&order);
        p.on_fulfilled(Handler::map(move |v: i32| {
            order.lock().push(format!("late {}", v));
            v + 1
        }))
    };

    assert_eq!(early.wait(), late.wait());
    assert_eq!(*order.lock(), vec!["early 10", "late 10"]);
}

#[test]
fn test_transitive_chain() {
    let a: Promise<&str, String> = Promise::new();
    let b = Promise::new();
    let c = Promise::new();
    a.chain(&b).unwrap();
    b.chain(&c).unwrap();

    a.reject("down".into()).unwrap();
    assert_eq!(c.wait(), Err("down".to_string()));
    assert!(matches!(c.chain(&c), Err(Error::SelfReference(_))));
}

#[test]
fn test_handler_returning_promise_is_adopted() {
    let outer: Promise<u32, String> = Promise::new();
    let inner: Promise<u32, String> = Promise::new();

    let adopter = inner.clone();
    let derived = outer.on_fulfilled(Handler::then(move |_| Ok(Resolution::Promise(adopter))));
    outer.fulfill(1).unwrap();
    assert_eq!(derived.state(), State::Pending);

    inner.fulfill(99).unwrap();
    assert_eq!(derived.wait(), Ok(99));
}

#[test]
fn test_rejection_reaches_fulfilment_only_derived() {
    let p: Promise<i32, String> = Promise::new();
    let mapped = p.on_fulfilled(Handler::map(|v: i32| v * 2));
    let recovered = p.on_rejected(Handler::try_map(|e: String| Ok(e.len() as i32)));

    p.reject("timeout".into()).unwrap();
    assert_eq!(mapped.wait(), Err("timeout".to_string()));
    assert_eq!(recovered.wait(), Ok(7));
}

#[test]
fn test_priority_order_end_to_end() {
    let log = recorder();
    let reactor = Reactor::new(transport(Arc::clone(&log)));

    let b = reactor.submit(Request::new("B")).unwrap();
    reactor
        .submit(Request::new("A").with_priority(Priority::High))
        .unwrap();
    reactor
        .submit(Request::new("C").with_priority(Priority::High))
        .unwrap();
    reactor.start().unwrap();

    assert_eq!(b.wait().unwrap(), "OK B");
    assert_eq!(*log.lock(), vec!["A", "C", "B"]);
}

#[test]
fn test_high_priority_overtakes_queued_normal_work() {
    let log = recorder();
    let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();
    let gate = Mutex::new(gate_rx);
    let seen = Arc::clone(&log);
    let reactor = Reactor::new(executor_fn(
        move |task: &Request| -> std::result::Result<String, Failure<String>> {
            if *task.payload() == "blocker" {
                let _ = gate.lock().recv();
            }
            seen.lock().push(task.payload().to_string());
            Ok(String::new())
        },
    ));
    reactor.start().unwrap();

    let blocker = reactor.submit(Request::new("blocker")).unwrap();
    while reactor.pending_tasks() > 0 {
        thread::yield_now();
    }
    let normal: Vec<_> = ["n1", "n2"]
        .into_iter()
        .map(|line| reactor.submit(Request::new(line)).unwrap())
        .collect();
    let urgent = reactor
        .submit(Request::new("urgent").with_priority(Priority::High))
        .unwrap();

    gate_tx.send(()).unwrap();
    blocker.wait().unwrap();
    urgent.wait().unwrap();
    for p in &normal {
        p.wait().unwrap();
    }
    assert_eq!(*log.lock(), vec!["blocker", "urgent", "n1", "n2"]);
}

#[test]
fn test_failure_rejects_with_transport_error() {
    let reactor = Reactor::new(transport(recorder()));
    reactor.start().unwrap();

    let task = Arc::new(Request::new("FAIL checksum mismatch").with_name("upload"));
    let promise = reactor.submit(Arc::clone(&task)).unwrap();

    let err = promise.wait().unwrap_err();
    assert_eq!(err.task().id, task.id());
    assert_eq!(err.task().name.as_deref(), Some("upload"));
    assert_eq!(err.partial().map(String::as_str), Some("partial"));
    assert_eq!(err.to_string(), "upload failed: checksum mismatch");
    assert_eq!(task.status(), iou::executor::TaskStatus::Completed);
}

#[test]
fn test_stop_and_wait_leaves_queue_pending() {
    let reactor = Reactor::new(transport(recorder()));
    reactor.start().unwrap();
    reactor.stop_and_wait(Some(Duration::from_secs(5))).unwrap();
    assert_eq!(reactor.state(), Lifecycle::Stopped);

    let queued = reactor.submit(Request::new("later")).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(queued.state(), State::Pending);
    assert_eq!(reactor.pending_tasks(), 1);

    reactor.start().unwrap();
    assert_eq!(queued.wait().unwrap(), "OK later");
}

#[test]
fn test_config_is_applied() {
    let config = ReactorConfig::builder()
        .thread_name("link-0")
        .idle_interval(Duration::from_millis(1))
        .drain_order(DrainOrder::LEGACY)
        .build()
        .unwrap();
    let reactor = Reactor::with_config(
        executor_fn(|_: &Task<(), String>| -> std::result::Result<String, Failure<String>> {
            Ok(thread::current().name().unwrap_or_default().to_string())
        }),
        config,
    )
    .unwrap();
    reactor.start().unwrap();

    let p = reactor.submit(Task::new(())).unwrap();
    assert_eq!(p.wait().unwrap(), "link-0");
    assert_eq!(reactor.config().drain_order, DrainOrder::LEGACY);
}

#[cfg(feature = "telemetry")]
#[test]
fn test_metrics_track_outcomes() {
    let reactor = Reactor::new(transport(recorder()));
    let ok = reactor.submit(Request::new("ping")).unwrap();
    let bad = reactor.submit(Request::new("FAIL nope")).unwrap();
    reactor.start().unwrap();

    ok.wait().unwrap();
    bad.wait().unwrap_err();

    let snapshot = reactor.metrics().snapshot();
    assert_eq!(snapshot.tasks_submitted, 2);
    assert_eq!(snapshot.tasks_executed, 2);
    assert_eq!(snapshot.tasks_failed, 1);
    assert_eq!(snapshot.failure_rate(), 0.5);

    let json = iou::telemetry::to_json(&snapshot).unwrap();
    assert!(json.contains("\"tasks_failed\": 1"));
}

#[cfg(feature = "async")]
#[test]
fn test_await_task_promise() {
    let reactor = Reactor::new(transport(recorder()));
    reactor.start().unwrap();

    let promise = reactor.submit(Request::new("async")).unwrap();
    let out = futures::executor::block_on(async move { promise.await });
    assert_eq!(out.unwrap(), "OK async");
}
