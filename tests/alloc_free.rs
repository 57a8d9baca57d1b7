//! Allocation-free processing tests.
//!
//! These tests verify that `Engine::process()` does not allocate. They run a
//! busy engine for several seconds with every control moving: queued edits,
//! swing, rotation, external clock and chain commands.
//!
//! Just run `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use rc_engine::{Engine, EngineConfig, Inputs, Params};
use rc_ir::{ChainSignal, Edit, OutputMode, TempoCvMode, MAX_RATIO_CHANNELS};

const SR: f32 = 44_100.0;

fn busy_engine() -> Engine {
    let mut engine = Engine::new(EngineConfig::new(SR, MAX_RATIO_CHANNELS));
    let ratios = [(3, 2), (5, 4), (7, 3), (1, 0), (99, 1), (1, 99), (0, 1), (4, 3), (2, 5)];
    for (i, &(multiply, divide)) in ratios.iter().enumerate() {
        engine.apply_edit(Edit::SetRatio {
            channel: (i + 1) as u8,
            multiply,
            divide,
        });
    }
    engine.set_running(true);
    engine
}

#[test]
fn internal_clock_alloc_free() {
    let mut engine = busy_engine();
    let frames = SR as usize * 5;

    assert_no_alloc(|| {
        for i in 0..frames {
            let t = i as f32 / SR;
            let params = Params {
                bpm: 140.0,
                tempo_cv: (t * 0.5).sin(),
                rotation: (t * 0.3).sin() * 4.0,
                swing: 40.0,
                swing_cv: (t * 0.7).cos(),
                ..Params::default()
            };
            engine.process(&params, &Inputs::INTERNAL);
        }
    });
}

#[test]
fn queued_edits_alloc_free() {
    let mut engine = busy_engine();
    let params = Params::with_bpm(200.0);
    let edits = [
        Edit::StepMultiply { channel: 1, up: true },
        Edit::StepDivide { channel: 2, up: false },
        Edit::Resync { channel: 3 },
        Edit::ResyncAll,
        Edit::SetOutputMode(OutputMode::Phasor),
        Edit::SetTempoCvMode(TempoCvMode::VoltPerOctave),
        Edit::Reset,
    ];

    assert_no_alloc(|| {
        for i in 0..SR as usize * 3 {
            if i % 1000 == 0 {
                let _ = engine.push_edit(edits[(i / 1000) % edits.len()]);
            }
            engine.process(&params, &Inputs::INTERNAL);
        }
    });
}

#[test]
fn external_clock_and_chain_alloc_free() {
    let mut engine = busy_engine();
    let params = Params::default();
    let interval = 11_025;
    let codes = [
        ChainSignal::Pulse,
        ChainSignal::Pulse,
        ChainSignal::Reset,
        ChainSignal::Pulse,
        ChainSignal::Off,
        ChainSignal::On,
    ];

    assert_no_alloc(|| {
        for i in 0..SR as usize * 5 {
            let voltage = if i % interval < 40 {
                codes[(i / interval) % codes.len()].voltage()
            } else {
                0.0
            };
            engine.process(&params, &Inputs::external(voltage));
        }
    });
}
