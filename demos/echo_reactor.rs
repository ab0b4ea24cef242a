//! Echo reactor example
//!
//! Drives a fake line-based link through a reactor: commands are queued at
//! different priorities, replies come back through promises.
//!
//! Installs a DEBUG-level fmt subscriber, so the reactor's own log lines
//! show up alongside the replies.

use iou::prelude::*;
use std::io;
use std::thread;
use std::time::Duration;

/// Pretends to be a serial device that echoes commands back.
struct FakeLink {
    sent: usize,
}

impl Executor for FakeLink {
    type Payload = String;
    type Output = String;

    fn execute(&mut self, task: &Task<String, String>) -> std::result::Result<String, Failure<String>> {
        thread::sleep(Duration::from_millis(20));
        self.sent += 1;

        let command = task.payload();
        if command.starts_with("RESET") {
            return Err(Failure::from(io::Error::new(io::ErrorKind::BrokenPipe, "link dropped"))
                .with_partial(format!("{} (no ack)", command)));
        }
        Ok(format!("ACK {} #{}", command, self.sent))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Echo Reactor Example ===\n");

    let config = ReactorConfig::builder()
        .thread_name("echo-link")
        .idle_interval(Duration::from_millis(10))
        .build()
        .expect("valid config");
    let reactor = Reactor::with_config(FakeLink { sent: 0 }, config).expect("reactor");

    let mut replies = Vec::new();
    for (command, priority) in [
        ("STATUS", Priority::Background),
        ("READ 0x10", Priority::Normal),
        ("READ 0x20", Priority::Normal),
        ("RESET", Priority::High),
        ("PING", Priority::High),
    ] {
        let task = Task::new(command.to_string())
            .with_priority(priority)
            .with_name(command);
        let promise = reactor.submit(task).expect("submit");

        let printed = promise.on_settled(Handler::map(move |outcome: std::result::Result<String, TransportError<String>>| {
            match outcome {
                Ok(reply) => println!("[{:>10}] {}", priority, reply),
                Err(err) => println!(
                    "[{:>10}] error: {} (partial: {:?})",
                    priority,
                    err,
                    err.partial()
                ),
            }
        }));
        replies.push(printed);
    }

    println!("Queued {} commands, starting link...\n", reactor.pending_tasks());
    reactor.start().expect("start");

    for reply in &replies {
        let _ = reply.wait();
    }

    reactor
        .stop_and_wait(Some(Duration::from_secs(1)))
        .expect("stop");

    let snapshot = reactor.metrics().snapshot();
    println!(
        "\nexecuted {} tasks, {} failed, p99 run time {:.1}ms",
        snapshot.tasks_executed,
        snapshot.tasks_failed,
        snapshot.p99_latency_ns as f64 / 1_000_000.0
    );

    println!("\n=== Example Complete ===");
}
