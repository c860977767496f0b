//! Kitchen and Fire Example
//!
//! Walks one simulated device through a quiet kitchen, a pan of boiling
//! water, and finally a real fire, printing the alert level on every tick.
//!
//! ## What You'll Learn
//!
//! - Wiring sensors, channels and a store into a `FireGuard`
//! - Running a clean-air calibration against a manual clock
//! - Why steam reads as COOKING and not as a fire
//! - How transitions report the rule and notification urgency
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_kitchen_and_fire
//! ```

use fireguard_core::{
    channels::AnalogConfig,
    errors::SensorResult,
    store::MemoryStore,
    time::{ManualClock, TimeSource},
    traits::{BarometerSample, HygrometerSample},
    AnalogSource, BarometricSensor, EnvironmentChannel, FireGuard, GasChannel, HygrometerSensor,
    SensorError, SmokeChannel,
};

/// Analog sensor whose output the simulation turns up and down
struct Knob {
    raw: u16,
    noise: u16,
}

impl AnalogSource for Knob {
    fn read_raw(&mut self) -> nb::Result<u16, SensorError> {
        // a little jitter so calibration sees a spread
        self.noise = (self.noise + 7) % 21;
        Ok(self.raw + self.noise)
    }
}

/// Hygrometer or barometer reading the simulated room
struct Room {
    temperature_c: f32,
    humidity_pct: f32,
    pressure_hpa: f32,
}

impl Room {
    fn set(&mut self, temperature_c: f32, humidity_pct: f32, pressure_hpa: f32) {
        self.temperature_c = temperature_c;
        self.humidity_pct = humidity_pct;
        self.pressure_hpa = pressure_hpa;
    }
}

impl HygrometerSensor for Room {
    fn init(&mut self) -> SensorResult<()> {
        Ok(())
    }

    fn read(&mut self) -> SensorResult<HygrometerSample> {
        Ok(HygrometerSample {
            temperature_c: self.temperature_c,
            humidity_pct: self.humidity_pct,
        })
    }
}

impl BarometricSensor for Room {
    fn init(&mut self) -> SensorResult<()> {
        Ok(())
    }

    fn read(&mut self) -> SensorResult<BarometerSample> {
        Ok(BarometerSample {
            temperature_c: self.temperature_c,
            pressure_hpa: self.pressure_hpa,
        })
    }
}

fn room() -> Room {
    Room {
        temperature_c: 22.0,
        humidity_pct: 45.0,
        pressure_hpa: 1012.0,
    }
}

type Device = FireGuard<Knob, Knob, Room, Room, MemoryStore<4>>;

/// One phase of the simulation
struct Phase {
    name: &'static str,
    smoke_raw: u16,
    gas_raw: u16,
    room: (f32, f32, f32),
    ticks: u64,
}

const PHASES: [Phase; 3] = [
    Phase { name: "Quiet kitchen", smoke_raw: 190, gas_raw: 290, room: (22.0, 45.0, 1012.0), ticks: 12 },
    Phase { name: "Pasta water boiling", smoke_raw: 900, gas_raw: 290, room: (29.0, 82.0, 1012.0), ticks: 16 },
    Phase { name: "Oil fire on the hob", smoke_raw: 1700, gas_raw: 290, room: (68.0, 30.0, 1005.0), ticks: 16 },
];

const TICK_MS: u64 = 5_000;

fn main() {
    println!("FireGuard Kitchen Example");
    println!("=========================\n");

    let mut device: Device = FireGuard::new(
        SmokeChannel::with_config(Knob { raw: 190, noise: 0 }, AnalogConfig::smoke().without_warmup()),
        GasChannel::with_config(Knob { raw: 290, noise: 0 }, AnalogConfig::gas().without_warmup()),
        EnvironmentChannel::new(room(), room()),
        MemoryStore::new(),
    );

    if let Err(e) = device.begin(0) {
        println!("Environment sensors missing: {}", e);
    }

    // Clean-air calibration; the manual clock absorbs the waits
    let mut clock = ManualClock::new(0);
    println!("Calibrating in clean air:");
    match device.calibrate_smoke(30, 100, &mut clock) {
        Ok(cal) => println!("  smoke thresholds {:?} (baseline {})", cal.thresholds, cal.baseline_avg),
        Err(e) => println!("  smoke calibration failed: {}", e),
    }
    match device.calibrate_gas(30, 100, &mut clock) {
        Ok(cal) => println!("  gas thresholds   {:?} (baseline {})", cal.thresholds, cal.baseline_avg),
        Err(e) => println!("  gas calibration failed: {}", e),
    }
    match device.calibrate_environment_baseline(&mut clock) {
        Ok(b) => println!(
            "  room baseline    {:.1} °C, {:.0} %, {:.1} hPa\n",
            b.temperature_c, b.humidity_pct, b.pressure_hpa
        ),
        Err(e) => println!("  baseline calibration failed: {}\n", e),
    }

    let mut now = clock.now();
    for phase in &PHASES {
        println!("{}", phase.name);
        println!("{}", "-".repeat(phase.name.len()));

        device.smoke_mut().source_mut().raw = phase.smoke_raw;
        device.gas_mut().source_mut().raw = phase.gas_raw;
        let (t, h, p) = phase.room;
        device.environment_mut().hygrometer_mut().set(t, h, p);
        device.environment_mut().barometer_mut().set(t, h, p);

        for _ in 0..phase.ticks {
            now += TICK_MS;
            let outcome = device.tick(now);

            if let Some(transition) = outcome.transition {
                println!(
                    "  t={:>4}s  {} -> {}  [{}] notify: {:?}",
                    now / 1_000,
                    transition.from,
                    transition.to,
                    transition.rule.unwrap_or("none"),
                    transition.notification
                );
            }
        }

        let last = device.smoke().last_reading();
        let env = device.environment().last_reading();
        println!(
            "  settled: {}  smoke {} ({} ppm), {:.1} °C, ΔP {:.1} hPa, fire p={:.2}\n",
            device.level(),
            last.state,
            last.ppm,
            env.temperature_c,
            env.pressure_delta,
            env.fire_probability
        );
    }

    println!("Steam raised the smoke reading but humidity kept the level at COOKING;");
    println!("dense smoke with heat and a pressure drop escalated to FIRE_CONFIRMED.");
}
