//! Waiting for the editor's live-value analysis.
//!
//! Waiting for analysis to load is slow, so most scenarios skip it; but a
//! scenario that reads live values without waiting is flaky. The
//! [`AnalysisLoadedToken`] resolves this with Poka-Yoke: [`await_analysis`]
//! requires a token, and the only way to get one is [`await_analysis_loaded`].
//! Calling them out of order does not compile.

use crate::driver::PageDriver;
use crate::result::E2eResult;
use crate::wait::{poll_until, wait_for_function};

const ANALYSIS_INITIALIZED: &str = "window.Dark?.analysis?.initialized";
const ANALYSIS_LAST_RUN: &str = "window.Dark?.analysis?.lastRun ?? null";

/// Proof that the editor's analysis has loaded
#[derive(Debug, Clone, Copy)]
pub struct AnalysisLoadedToken {
    _private: (),
}

/// Wait until analysis is initialised and hand out the token
pub async fn await_analysis_loaded<D: PageDriver + ?Sized>(
    page: &D,
) -> E2eResult<AnalysisLoadedToken> {
    let loaded = wait_for_function(page, ANALYSIS_INITIALIZED).await?;
    tracing::debug!(elapsed_ms = loaded.elapsed.as_millis() as u64, "analysis loaded");
    Ok(AnalysisLoadedToken { _private: () })
}

/// Timestamp (ms since epoch) of the latest analysis run, if any ran yet
pub async fn last_analysis_run<D: PageDriver + ?Sized>(
    page: &D,
    _token: &AnalysisLoadedToken,
) -> E2eResult<Option<f64>> {
    Ok(page.evaluate(ANALYSIS_LAST_RUN).await?.as_f64())
}

/// Wait for an analysis run newer than `last_timestamp`; returns its timestamp
pub async fn await_analysis<D: PageDriver + ?Sized>(
    page: &D,
    last_timestamp: f64,
    _token: &AnalysisLoadedToken,
) -> E2eResult<f64> {
    let options = page.wait_options();
    let result = poll_until(
        options.timeout(),
        options.poll_interval(),
        "analysis to run",
        move || async move {
            let last_run = page.evaluate(ANALYSIS_LAST_RUN).await?.as_f64();
            Ok(last_run.filter(|run| *run > last_timestamp))
        },
    )
    .await?;

    let diff_in_secs = (result.value - last_timestamp) / 1000.0;
    tracing::info!("Analysis ran in ~ {diff_in_secs}secs");
    Ok(result.value)
}
