/// Fraction of the encoded request body that has left the client, in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct UploadProgress(f64);

// Largest value reported while bytes are still in flight.
const IN_FLIGHT_MAX: f64 = 1.0 - f64::EPSILON;

impl UploadProgress {
    pub const START: Self = Self(0.0);
    pub const COMPLETE: Self = Self(1.0);

    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::START;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Progress for `sent` of `total` bytes while the transfer is still running.
    /// Never reaches 1.0.
    pub fn in_flight(sent: u64, total: u64) -> Self {
        if total == 0 {
            return Self::START;
        }
        Self::new((sent as f64 / total as f64).min(IN_FLIGHT_MAX))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }

    pub fn is_complete(self) -> bool {
        self.0 >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_into_range() {
        assert_eq!(UploadProgress::new(-0.5), UploadProgress::START);
        assert_eq!(UploadProgress::new(3.0), UploadProgress::COMPLETE);
        assert_eq!(UploadProgress::new(f64::NAN), UploadProgress::START);
        assert_eq!(UploadProgress::new(0.25).value(), 0.25);
    }

    #[test]
    fn test_in_flight_stays_below_complete() {
        assert_eq!(UploadProgress::in_flight(50, 200).value(), 0.25);
        assert!(!UploadProgress::in_flight(200, 200).is_complete());
        assert!(!UploadProgress::in_flight(u64::MAX - 1, u64::MAX).is_complete());
        assert_eq!(UploadProgress::in_flight(10, 0), UploadProgress::START);
    }
}
