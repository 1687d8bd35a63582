use tracing::info;

use super::{Frame, RenderSink};
use crate::errors::ClientError;

/// One structured log line per frame.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    frames: u64,
}

impl ConsoleSink {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |x| format!("{x:.3}"))
}

impl RenderSink for ConsoleSink {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), ClientError> {
        let st = frame.state;
        let k = &st.kinematics;
        let mode = st.mode.map_or("-", |m| m.label());
        let (rate_lo, rate_hi) = st.ranges.rate.map_or((0.0, 0.0), |r| (r.lo, r.hi));

        info!(
            event = "frame",
            tick = st.tick,
            mode,
            step = st.step.unwrap_or_default(),
            w_norm = format_args!("{:.4}", k.rate.norm),
            theta = format_args!("{:.1}", k.rate.theta_deg),
            phi = format_args!("{:.1}", k.rate.phi_deg),
            w_b_angle = %fmt_opt(k.rate_field_angle_deg),
            sun_valid = k.sun.valid,
            sun_x = format_args!("{:.1}", st.sun_angles.x_deg),
            sun_y = format_args!("{:.1}", st.sun_angles.y_deg),
            spin_x_hz = format_args!("{:.3}", st.spin.hz.x),
            spin_y_hz = format_args!("{:.3}", st.spin.hz.y),
            spin_z_hz = format_args!("{:.3}", st.spin.hz.z),
            rate_lo = format_args!("{:.3}", rate_lo),
            rate_hi = format_args!("{:.3}", rate_hi),
        );

        if let (Some(o), Some(p)) = (&k.orbit, &st.track) {
            info!(
                event = "track",
                tick = st.tick,
                lat = format_args!("{:.2}{}", p.lat.abs(), p.north_south),
                lon = format_args!("{:.2}{}", p.lon.abs(), p.east_west),
                alt_km = format_args!("{:.1}", o.alt_km),
                gap = p.gap,
                battery_wh = %fmt_opt(o.battery_wh),
            );
        }

        self.frames += 1;
        Ok(())
    }
}
