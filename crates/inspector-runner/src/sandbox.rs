//! Per-module script engine with a cooperative deadline and seeded randomness.

use std::cell::Cell;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rhai::{Array, Engine, EvalAltResult, FLOAT, INT};

use crate::ScriptLimits;

thread_local! {
    static DEADLINE: Cell<Option<Instant>> = const { Cell::new(None) };
}

/// Operations between deadline checks.
const CHECK_INTERVAL: u64 = 256;

/// Arms the current thread's deadline until dropped.
///
/// Any script running on this thread is terminated at its next progress
/// check once the deadline passes.
pub struct DeadlineGuard {
    previous: Option<Instant>,
}

impl DeadlineGuard {
    pub fn set(deadline: Instant) -> Self {
        let previous = DEADLINE.with(|d| d.replace(Some(deadline)));
        Self { previous }
    }
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        DEADLINE.with(|d| d.set(self.previous));
    }
}

fn deadline_passed() -> bool {
    DEADLINE.with(|d| d.get().is_some_and(|t| Instant::now() >= t))
}

/// Build the engine for one module.
///
/// The generator is created here, from `seed`, so every load starts from
/// the same random state.
pub fn build_engine(module: &str, limits: &ScriptLimits, seed: u64) -> Engine {
    let mut engine = Engine::new();
    engine.set_max_call_levels(limits.max_call_depth);

    engine.on_progress(|ops| {
        if ops % CHECK_INTERVAL == 0 && deadline_passed() {
            Some("deadline exceeded".into())
        } else {
            None
        }
    });

    let print_module = module.to_string();
    engine.on_print(move |text| tracing::debug!("[{print_module}] {text}"));
    let debug_module = module.to_string();
    engine.on_debug(move |text, _source, pos| {
        tracing::debug!("[{debug_module}] {pos:?}: {text}")
    });

    register_random(&mut engine, seed);
    engine
}

fn register_random(engine: &mut Engine, seed: u64) {
    let rng = Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed)));

    let r = Arc::clone(&rng);
    engine.register_fn("random", move || -> FLOAT {
        r.lock().unwrap_or_else(|e| e.into_inner()).random::<FLOAT>()
    });

    let r = Arc::clone(&rng);
    engine.register_fn(
        "random_range",
        move |lo: INT, hi: INT| -> Result<INT, Box<EvalAltResult>> {
            if lo >= hi {
                return Err(format!("random_range: empty range {lo}..{hi}").into());
            }
            Ok(r.lock().unwrap_or_else(|e| e.into_inner()).random_range(lo..hi))
        },
    );

    let r = rng;
    engine.register_fn("shuffle", move |items: &mut Array| {
        items.shuffle(&mut *r.lock().unwrap_or_else(|e| e.into_inner()));
    });
}
