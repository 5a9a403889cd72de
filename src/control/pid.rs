// ---------------------------------------------------------------------------
// PID loop on a normalized error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Pid {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Output saturation, symmetric.
    pub limit: f64,
    integral: f64,
    prev_error: Option<f64>,
}

impl Pid {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd, limit: f64::INFINITY, integral: 0.0, prev_error: None }
    }

    pub fn limit(mut self, limit: f64) -> Self {
        self.limit = limit.abs();
        self
    }

    /// One update. The first call after a reset has no derivative term.
    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        self.integral = (self.integral + error * dt).clamp(-1.0, 1.0);
        let derivative = match self.prev_error {
            Some(prev) if dt > 0.0 => (error - prev) / dt,
            _ => 0.0,
        };
        self.prev_error = Some(error);
        (self.kp * error + self.ki * self.integral + self.kd * derivative).clamp(-self.limit, self.limit)
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pid_proportional() {
        let mut pid = Pid::new(2.0, 0.0, 0.0);
        assert!((pid.update(0.25, 0.25) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn integral_is_bounded() {
        let mut pid = Pid::new(0.0, 1.0, 0.0);
        for _ in 0..100 {
            pid.update(1.0, 0.25);
        }
        assert_eq!(pid.update(1.0, 0.25), 1.0);
    }

    #[test]
    fn no_derivative_kick_after_reset() {
        let mut pid = Pid::new(0.0, 0.0, 1.0);
        pid.update(-3.0, 0.25);
        pid.reset();
        assert_eq!(pid.update(1.0, 0.25), 0.0);
        assert!((pid.update(1.5, 0.25) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn output_saturates() {
        let mut pid = Pid::new(10.0, 0.0, 0.0).limit(1.0);
        assert_eq!(pid.update(0.5, 0.1), 1.0);
        assert_eq!(pid.update(-0.5, 0.1), -1.0);
    }
}
