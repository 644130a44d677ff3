//! Performance benchmarks for the simulation engine and request handling

use server::dispatcher::Dispatcher;
use server::state::ServerState;
use shared::{encode_frame, read_frame, Life, ANONYMOUS_USER};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Square grid with a repeating pattern of live cells
fn dense_grid(size: usize) -> Life {
    let mut life = Life::empty(size, size);
    for row in 0..size {
        for col in 0..size {
            if (row * 7 + col * 3) % 5 < 2 {
                life.set_alive(row, col, true);
            }
        }
    }
    life
}

/// Benchmarks generation steps on a large grid
#[test]
fn benchmark_life_step() {
    let mut life = dense_grid(200);
    let iterations = 100;
    let start = Instant::now();

    for _ in 0..iterations {
        life.step();
    }

    let duration = start.elapsed();
    println!(
        "Life step (200x200): {} generations in {:?} ({:.2} ms/gen)",
        iterations,
        duration,
        duration.as_secs_f64() * 1000.0 / iterations as f64
    );

    assert_eq!(life.generation(), iterations);
    // Should complete in under 10 seconds even unoptimized
    assert!(duration.as_secs() < 10);
}

/// Benchmarks rendering, which runs on every watch request
#[test]
fn benchmark_life_render() {
    let life = dense_grid(100);
    let iterations = 1_000;
    let start = Instant::now();

    let mut total = 0;
    for _ in 0..iterations {
        total += life.render().len();
    }

    let duration = start.elapsed();
    println!(
        "Render (100x100): {} renders in {:?} ({:.2} μs/render)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // three characters per cell plus a newline per row
    assert_eq!(total, iterations * (100 * 300 + 100));
    assert!(duration.as_secs() < 10);
}

/// Benchmarks reading many frames from one buffer
#[tokio::test]
async fn benchmark_frame_decoding() {
    let frames = 10_000;
    let mut wire = Vec::new();
    for i in 0..frames {
        wire.extend_from_slice(&encode_frame(&format!("watch session{}", i)));
    }

    let mut reader = wire.as_slice();
    let start = Instant::now();

    let mut decoded = 0;
    while let Some(frame) = read_frame(&mut reader).await.unwrap() {
        assert!(frame.starts_with("watch "));
        decoded += 1;
    }

    let duration = start.elapsed();
    println!("Frame decoding: {} frames in {:?}", decoded, duration);

    assert_eq!(decoded, frames);
    assert!(duration.as_secs() < 5);
}

/// Benchmarks dispatching read-only requests against a populated server
#[tokio::test]
async fn benchmark_dispatch() {
    let configs = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("predefined_configs");
    let state = Arc::new(ServerState::new(configs, Duration::from_secs(3600)));
    let dispatcher = Dispatcher::new(state);

    dispatcher.dispatch(ANONYMOUS_USER, "register alice pw").await;
    for i in 0..50 {
        dispatcher.dispatch("alice", &format!("add s{}", i)).await;
        dispatcher
            .dispatch("alice", &format!("start s{} pulsar", i))
            .await;
    }

    let iterations = 5_000;
    let start = Instant::now();

    for i in 0..iterations {
        let line = if i % 2 == 0 {
            format!("watch s{}", i % 50)
        } else {
            "list".to_string()
        };
        let reply = dispatcher.dispatch(ANONYMOUS_USER, &line).await;
        assert!(!reply.text.is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Dispatch: {} requests in {:?} ({:.2} μs/request)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_secs() < 10);

    for i in 0..50 {
        dispatcher.dispatch("alice", &format!("kill s{}", i)).await;
    }
    assert_eq!(dispatcher.state().session_count().await, 0);
}
