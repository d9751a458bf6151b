//! Center-aligned space-vector modulation of the stationary-frame voltage
//! command.
use core::f32::consts::PI;

use libm::{atan2f, cosf, fabsf, sinf, sqrtf};

use crate::park::AlphaBetaVoltage;

// Alpha/beta arrive as signed-14-bit counts; unity modulation index sits
// at 2^14 counts.
const FULL_SCALE: f32 = 16384.;

const SQRT3: f32 = 1.732_050_8;

/// Bus voltage and PWM period, fixed for a control session.
#[derive(Debug, Clone, Copy)]
pub struct PwmConfig {
    /// Volts
    pub vbus: f32,
    /// Seconds
    pub period: f32,
}

/// Triangular-carrier position, the one piece of state that persists
/// across ticks. The stored scalar is the integrated slope command; the
/// comparator sees it through [`Carrier::ramp`], scaled so one triangle
/// spans `[0, period]` in switching-time units.
#[derive(Debug, Clone, Copy)]
pub struct Carrier {
    state: f32,
    rising: bool,
    period: f32,
}

impl Carrier {
    fn new(period: f32) -> Self {
        Carrier {
            state: 0.,
            rising: true,
            period,
        }
    }

    pub fn ramp(&self) -> f32 {
        4. * self.state
    }

    /// Integrate a commanded slope over `dt`. The slope command is a
    /// 0/1 pulse train, so the integrated state is zero-mean:
    /// `d(state)/dt = slope - 0.5`.
    pub fn integrate(&mut self, slope: f32, dt: f32) {
        self.state += (slope - 0.5) * dt;
    }

    /// Advance the nominal triangle by `dt`: slope magnitude 0.5 with
    /// reflection at the peaks. At a steady tick rate this matches
    /// [`Carrier::integrate`] driven by the nominal square-wave slope
    /// command.
    pub fn advance(&mut self, dt: f32) {
        let peak = self.period / 4.;
        let mut remaining = 0.5 * dt;
        while remaining > 0. {
            if self.rising {
                let room = peak - self.state;
                if remaining < room {
                    self.state += remaining;
                    remaining = 0.;
                } else {
                    self.state = peak;
                    remaining -= room;
                    self.rising = false;
                }
            } else {
                let room = self.state;
                if remaining < room {
                    self.state -= remaining;
                    remaining = 0.;
                } else {
                    self.state = 0.;
                    remaining -= room;
                    self.rising = true;
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = 0.;
        self.rising = true;
    }
}

/// Per-tick modulator output: three half-bridge levels, each 0 or `vbus`,
/// plus the diagnostic signals.
#[derive(Debug, Clone, Copy)]
pub struct PwmResult {
    pub u: f32,
    pub v: f32,
    pub w: f32,
    /// Radians
    pub angle: f32,
    /// 1..=6
    pub sector: u8,
    /// Carrier position in switching-time units
    pub ramp: f32,
    /// First active-vector dwell time, seconds
    pub t1: f32,
    /// Second active-vector dwell time, seconds
    pub t2: f32,
    /// Zero-vector dwell time, seconds
    pub tz: f32,
}

/// SVPWM engine. Owns the carrier; everything else is computed fresh from
/// the current-tick inputs. One instance per motor channel.
#[derive(Debug, Clone)]
pub struct Modulator {
    config: PwmConfig,
    carrier: Carrier,
}

impl Modulator {
    pub fn new(config: PwmConfig) -> Self {
        if !(config.vbus > 0.) || !(config.period > 0.) {
            log::error!(
                "Invalid PWM parameters, vbus: {}, period: {}",
                config.vbus,
                config.period
            );
            panic!();
        }
        Modulator {
            config,
            carrier: Carrier::new(config.period),
        }
    }

    /// Integrate the commanded carrier slope over `dt`, then modulate.
    /// This is the continuous-time simulation contract.
    pub fn update(&mut self, input: AlphaBetaVoltage, slope: f32, dt: f32) -> PwmResult {
        self.carrier.integrate(slope, dt);
        self.output(input)
    }

    /// Advance the internal nominal triangle by `dt`, then modulate. This
    /// is the deterministic form for event-driven targets.
    pub fn step(&mut self, input: AlphaBetaVoltage, dt: f32) -> PwmResult {
        self.carrier.advance(dt);
        self.output(input)
    }

    /// Restore the carrier to the start-of-control state.
    pub fn reset(&mut self) {
        self.carrier.reset();
    }

    pub fn carrier(&self) -> &Carrier {
        &self.carrier
    }

    /// Compute the phase levels against the current carrier position
    /// without advancing it.
    pub fn output(&self, input: AlphaBetaVoltage) -> PwmResult {
        let PwmConfig { vbus, period } = self.config;
        let alpha = input.alpha / FULL_SCALE;
        let beta = input.beta / FULL_SCALE;

        let angle = atan2f(beta, alpha);
        let deg = angle * 180. / PI;
        let mi = sqrtf(alpha * alpha + beta * beta);
        if mi > 1. {
            log::warn!("Modulation index beyond linear range: {}", mi);
        }

        let sector = sector_of(deg);
        let n = sector as f32;

        // Dwell fractions of the two active vectors adjacent to the
        // sector; the remainder of the period goes to the zero vector.
        let del1 =
            (2. / SQRT3) * mi * (cosf(angle) * sinf(n * PI / 3.) - sinf(angle) * cosf(n * PI / 3.));
        let del2 = (2. / SQRT3)
            * mi
            * (sinf(angle) * cosf((n - 1.) * PI / 3.) - cosf(angle) * sinf((n - 1.) * PI / 3.));
        let del3 = 1. - fabsf(del1) - fabsf(del2);

        let t1 = del1 * period;
        let t2 = del2 * period;
        let tz = del3 * period;

        // Center-aligned compare thresholds.
        let td = tz / 2.;
        let ta = t1 + t2 + td;
        let tb = t1 + td;
        let tc = t2 + td;

        // Route the thresholds to the half-bridges for this sector.
        let (sine1, sine2, sine3) = match sector {
            1 => (ta, tc, td),
            2 => (tb, ta, td),
            3 => (td, ta, tc),
            4 => (td, tb, ta),
            5 => (tc, td, ta),
            6 => (ta, td, tb),
            _ => (ta, tc, td),
        };

        let ramp = self.carrier.ramp();
        let level = |threshold: f32| if threshold > ramp { vbus } else { 0. };

        log::debug!(
            "Modulating, angle: {} rad, sector: {}, mi: {}, ramp: {}",
            angle,
            sector,
            mi,
            ramp
        );

        PwmResult {
            u: level(sine1),
            v: level(sine2),
            w: level(sine3),
            angle,
            sector,
            ramp,
            t1,
            t2,
            tz,
        }
    }
}

/// Maps the vector angle in degrees onto one of the six 60-degree sectors.
/// The band edges follow the reference policy exactly: the first band is
/// closed on both ends, the positive bands take their upper edge, the
/// negative bands take the edge nearer zero. Exactly -180 matches no band
/// and falls through to the sector-1 default.
fn sector_of(deg: f32) -> u8 {
    if deg >= 0. && deg <= 60. {
        1
    } else if deg > 60. && deg <= 120. {
        2
    } else if deg > 120. && deg <= 180. {
        3
    } else if deg < -120. && deg > -180. {
        4
    } else if deg < -60. && deg >= -120. {
        5
    } else if deg < 0. && deg >= -60. {
        6
    } else {
        1
    }
}
