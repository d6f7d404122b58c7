use std::future::Future;

use tokio::time::sleep;

use crate::{CancellationSignal, GraylogError, PollOptions, Result};

/// Re-evaluates `predicate` until it returns `true` or `options.timeout_ms` elapses.
///
/// Each invocation creates its own [`CancellationSignal`] and hands a copy to
/// every evaluation, so predicates can bound their own requests by it.
/// Evaluations are strictly sequential and separated by `options.interval_ms`.
///
/// Termination:
/// - `Ok(true)` from the predicate returns `Ok(())` immediately, without a
///   trailing delay.
/// - the deadline firing while an evaluation or a delay is pending returns
///   [`GraylogError::Timeout`] naming `condition`. No evaluation starts once
///   the deadline has passed.
/// - any `Err` from the predicate is returned as-is, with no further
///   evaluations. The engine does not classify errors: a predicate that wants
///   transport failures treated as "not ready" must map them to `Ok(false)`
///   itself, e.g. with [`not_ready_on_transport`].
pub async fn repeat_until<F, Fut>(
    condition: &str,
    options: &PollOptions,
    mut predicate: F,
) -> Result<()>
where
    F: FnMut(CancellationSignal) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let signal = CancellationSignal::after(options.timeout());
    let interval = options.interval();
    let mut attempt = 0u64;

    loop {
        if signal.is_cancelled() {
            return Err(timed_out(condition, &signal, attempt));
        }
        attempt += 1;

        let satisfied = tokio::select! {
            biased;
            outcome = predicate(signal) => match outcome {
                Err(GraylogError::Cancelled) => {
                    return Err(timed_out(condition, &signal, attempt));
                }
                other => other?,
            },
            () = signal.cancelled() => return Err(timed_out(condition, &signal, attempt)),
        };

        if satisfied {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                condition,
                attempt,
                elapsed_ms = signal.elapsed().as_millis() as u64,
                "poll condition satisfied"
            );
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            condition,
            attempt,
            interval_ms = options.interval_ms,
            "poll condition not yet satisfied"
        );

        tokio::select! {
            biased;
            () = signal.cancelled() => return Err(timed_out(condition, &signal, attempt)),
            () = sleep(interval) => {}
        }
    }
}

/// Maps a transport failure to "not ready" (`Ok(false)`), leaving every
/// other outcome untouched.
///
/// Use it inside a predicate when an unreachable service is an expected
/// state at that call site, such as while waiting for the service to start
/// listening.
pub fn not_ready_on_transport(outcome: Result<bool>) -> Result<bool> {
    match outcome {
        Err(GraylogError::Transport(_err)) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(error = %_err, "service not reachable yet");
            Ok(false)
        }
        other => other,
    }
}

fn timed_out(condition: &str, signal: &CancellationSignal, _attempts: u64) -> GraylogError {
    #[cfg(feature = "tracing")]
    tracing::warn!(
        condition,
        attempts = _attempts,
        waited_ms = signal.elapsed().as_millis() as u64,
        "poll timed out"
    );

    GraylogError::Timeout {
        condition: condition.to_owned(),
        waited: signal.elapsed(),
    }
}
