//! Fuzz target for fault data validation and a single EM step.
//!
//! Tests that validation and the EM step return errors instead of panicking
//! on arbitrary records.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use phsrm_core::{cf1_emstep, EmIterate, EngineConfig, FaultData};

#[derive(Debug, Arbitrary)]
struct Input {
    time: Vec<f64>,
    fault: Vec<u16>,
    kind: Vec<u8>,
    rate: (f64, f64),
}

fuzz_target!(|input: Input| {
    if input.time.len() > 32 {
        return;
    }
    let fault = input.fault.iter().map(|&f| u64::from(f)).collect();
    let Ok(data) = FaultData::new(input.time, fault, input.kind) else {
        return;
    };
    let Ok(start) = EmIterate::new(10.0, vec![0.5, 0.5], vec![input.rate.0, input.rate.1]) else {
        return;
    };
    let config = EngineConfig::default().with_max_right(10_000);
    let _ = cf1_emstep(&start, &data, &config);
});
