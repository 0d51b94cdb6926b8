//! Shared test utilities for `logqueryid_host` integration tests.
//!
//! Import via `mod test_utils;` in test files.

#![allow(
    dead_code,
    missing_docs,
    reason = "shared test utilities, not all items used in every test binary"
)]

use std::sync::Arc;

use logqueryid_host::executor::Executor;
use logqueryid_host::hooks::{finish_hook, run_hook, start_hook};
use parking_lot::Mutex;

// ═══════════════════════════════════════════════════════════════════════════════
// HOOK RECORDING
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered log of hook invocations, shared between hooks and the test.
pub type Trace = Arc<Mutex<Vec<String>>>;

pub fn new_trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn snapshot(trace: &Trace) -> Vec<String> {
    trace.lock().clone()
}

/// Installs recording hooks in every slot of `executor`.
///
/// Each hook appends `"<point> <query_id>"` (prefixed by `label`) and then
/// delegates to the standard implementation.
pub fn install_recorder(executor: &Executor, label: &'static str, trace: &Trace) {
    let mut hooks = executor.hooks_mut();

    let t = Arc::clone(trace);
    hooks.start = Some(start_hook(move |executor, desc, eflags| {
        t.lock().push(format!("{label} start {}", desc.query_id()));
        executor.standard_start(desc, eflags)
    }));

    let t = Arc::clone(trace);
    hooks.run = Some(run_hook(move |executor, desc, direction, count, once| {
        t.lock().push(format!("{label} run {}", desc.query_id()));
        executor.standard_run(desc, direction, count, once)
    }));

    let t = Arc::clone(trace);
    hooks.finish = Some(finish_hook(move |executor, desc| {
        t.lock().push(format!("{label} finish {}", desc.query_id()));
        executor.standard_finish(desc)
    }));
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
