//! # Tick Benchmarks
//!
//! Cost of one polling cycle and of the pieces it is made of.
//!
//! Run: `cargo bench --bench device_tick`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fireguard_core::{
    arbiter::{AlertArbiter, AlertInputs},
    channels::{environment, AnalogConfig},
    errors::SensorResult,
    filter::SamplingFilter,
    store::MemoryStore,
    traits::{BarometerSample, HygrometerSample},
    AnalogSource, BarometricSensor, EnvironmentChannel, FireGuard, GasChannel, HygrometerSensor,
    SensorError, SmokeChannel, SmokeState,
};

/// Sensor that always reports the same room
struct Steady {
    raw: u16,
}

impl AnalogSource for Steady {
    fn read_raw(&mut self) -> nb::Result<u16, SensorError> {
        Ok(self.raw)
    }
}

impl HygrometerSensor for Steady {
    fn init(&mut self) -> SensorResult<()> {
        Ok(())
    }

    fn read(&mut self) -> SensorResult<HygrometerSample> {
        Ok(HygrometerSample { temperature_c: 31.5, humidity_pct: 78.0 })
    }
}

impl BarometricSensor for Steady {
    fn init(&mut self) -> SensorResult<()> {
        Ok(())
    }

    fn read(&mut self) -> SensorResult<BarometerSample> {
        Ok(BarometerSample { temperature_c: 31.0, pressure_hpa: 1011.0 })
    }
}

fn bench_device(c: &mut Criterion) {
    let mut group = c.benchmark_group("device");

    let mut device = FireGuard::new(
        SmokeChannel::with_config(Steady { raw: 950 }, AnalogConfig::smoke().without_warmup()),
        GasChannel::with_config(Steady { raw: 400 }, AnalogConfig::gas().without_warmup()),
        EnvironmentChannel::new(Steady { raw: 0 }, Steady { raw: 0 }),
        MemoryStore::<4>::new(),
    );
    let _ = device.begin(0);

    let mut now = 0u64;
    group.bench_function("tick", |b| {
        b.iter(|| {
            now += 5_000;
            black_box(device.tick(black_box(now)))
        })
    });

    group.finish();
}

fn bench_stages(c: &mut Criterion) {
    let mut group = c.benchmark_group("stages");

    let mut filter = SamplingFilter::<15>::new();
    let mut raw = 0u16;
    group.bench_function("filter_push_average", |b| {
        b.iter(|| {
            raw = (raw + 37) % 4096;
            filter.push(i32::from(raw));
            black_box(filter.average())
        })
    });

    let inputs = AlertInputs {
        smoke: SmokeState::Detected,
        temperature_c: 42.0,
        humidity_pct: Some(35.0),
        pressure_delta: -3.5,
        ..AlertInputs::default()
    };
    group.bench_function("arbiter_fallthrough", |b| {
        b.iter(|| black_box(AlertArbiter::evaluate(black_box(&inputs))))
    });

    group.bench_function("altitude", |b| {
        b.iter(|| black_box(environment::altitude_m(black_box(1001.5))))
    });

    group.finish();
}

criterion_group!(benches, bench_device, bench_stages);
criterion_main!(benches);
