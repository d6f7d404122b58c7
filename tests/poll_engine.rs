use std::{
    cell::{Cell, RefCell},
    time::Duration,
};

use graylog_poll::{repeat_until, GraylogError, PollOptions};
use tokio::time::Instant;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[tokio::test(start_paused = true)]
async fn succeeds_after_exactly_n_plus_one_evaluations() {
    let calls = Cell::new(0u32);
    let start = Instant::now();

    repeat_until("fourth call", &PollOptions::new(100, 500), |_| {
        calls.set(calls.get() + 1);
        let ready = calls.get() > 3;
        async move { Ok::<_, GraylogError>(ready) }
    })
    .await
    .expect("condition must be satisfied before the deadline");

    assert_eq!(calls.get(), 4);
    assert_eq!(start.elapsed(), ms(300));
}

#[tokio::test(start_paused = true)]
async fn never_true_times_out_within_one_interval_of_deadline() {
    let evaluations = RefCell::new(Vec::new());
    let start = Instant::now();

    let err = repeat_until("never", &PollOptions::new(100, 300), |_| {
        evaluations.borrow_mut().push(start.elapsed());
        async { Ok::<_, GraylogError>(false) }
    })
    .await
    .expect_err("predicate never returns true");

    let elapsed = start.elapsed();
    assert!(elapsed >= ms(300), "gave up early: {elapsed:?}");
    assert!(elapsed <= ms(400), "gave up late: {elapsed:?}");

    match err {
        GraylogError::Timeout { condition, waited } => {
            assert_eq!(condition, "never");
            assert!(waited >= ms(300));
        }
        other => panic!("expected timeout, got {other:?}"),
    }

    let evaluations = evaluations.into_inner();
    assert_eq!(evaluations, vec![ms(0), ms(100), ms(200)]);
    assert!(evaluations.iter().all(|at| *at < ms(300)));
}

#[tokio::test(start_paused = true)]
async fn deadline_during_delay_skips_next_evaluation() {
    let calls = Cell::new(0u32);
    let start = Instant::now();

    let err = repeat_until("slow interval", &PollOptions::new(1_000, 250), |_| {
        calls.set(calls.get() + 1);
        async { Ok::<_, GraylogError>(false) }
    })
    .await
    .expect_err("interval is longer than the timeout");

    assert!(matches!(err, GraylogError::Timeout { .. }));
    assert_eq!(calls.get(), 1);
    assert_eq!(start.elapsed(), ms(250));
}

#[tokio::test(start_paused = true)]
async fn non_transport_error_propagates_without_retry() {
    let calls = Cell::new(0u32);

    let err = repeat_until("decodable", &PollOptions::new(10, 1_000), |_| {
        calls.set(calls.get() + 1);
        async { Err::<bool, _>(GraylogError::Decode("unexpected shape".to_owned())) }
    })
    .await
    .expect_err("decode errors are fatal");

    assert!(matches!(err, GraylogError::Decode(message) if message == "unexpected shape"));
    assert_eq!(calls.get(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_predicate_is_abandoned_at_deadline() {
    let start = Instant::now();

    let err = repeat_until("slow request", &PollOptions::new(10, 300), |_| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok::<_, GraylogError>(true)
    })
    .await
    .expect_err("predicate outlives the deadline");

    assert!(matches!(err, GraylogError::Timeout { .. }));
    assert_eq!(start.elapsed(), ms(300));
}

#[tokio::test(start_paused = true)]
async fn cancelled_request_surfaces_as_timeout() {
    let err = repeat_until("signal-aware request", &PollOptions::new(10, 200), |signal| async move {
        signal.cancelled().await;
        Err::<bool, _>(GraylogError::Cancelled)
    })
    .await
    .expect_err("request observes the deadline");

    match err {
        GraylogError::Timeout { condition, waited } => {
            assert_eq!(condition, "signal-aware request");
            assert_eq!(waited, ms(200));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn each_invocation_gets_its_own_deadline() {
    let options = PollOptions::new(50, 200);

    let first = repeat_until("first", &options, |_| async { Ok::<_, GraylogError>(false) }).await;
    assert!(matches!(first, Err(GraylogError::Timeout { .. })));

    let calls = Cell::new(0u32);
    let start = Instant::now();
    repeat_until("second", &options, |signal| {
        calls.set(calls.get() + 1);
        let ready = calls.get() == 3;
        assert_eq!(signal.remaining(), ms(200) - start.elapsed());
        async move { Ok::<_, GraylogError>(ready) }
    })
    .await
    .expect("a fresh timer must be started");
    assert_eq!(calls.get(), 3);
}

#[tokio::test(start_paused = true)]
async fn concurrent_polls_are_isolated() {
    let fast_calls = Cell::new(0u32);
    let start = Instant::now();

    let fast_opts = PollOptions::new(100, 1_000);
    let never_opts = PollOptions::new(100, 300);
    let fast = repeat_until("fast", &fast_opts, |_| {
        fast_calls.set(fast_calls.get() + 1);
        let ready = fast_calls.get() == 2;
        async move { Ok::<_, GraylogError>(ready) }
    });
    let never = repeat_until("never", &never_opts, |_| async {
        Ok::<_, GraylogError>(false)
    });

    let (fast, never) = tokio::join!(fast, never);

    fast.expect("fast poll must succeed");
    assert!(matches!(never, Err(GraylogError::Timeout { condition, .. }) if condition == "never"));
    assert_eq!(fast_calls.get(), 2);
    assert_eq!(start.elapsed(), ms(300));
}
