use crate::config::NO_FINGER_SIGNAL_THRESHOLD;

/// Whether the raw amplitude indicates a finger on the sensor.
///
/// Strictly greater-than: an amplitude exactly at the threshold still reads
/// as no contact.
pub fn finger_on_sensor(amplitude: i32) -> bool {
    amplitude > NO_FINGER_SIGNAL_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_strict() {
        assert!(!finger_on_sensor(50));
        assert!(finger_on_sensor(51));
    }

    #[test]
    fn quiet_and_negative_samples_read_as_no_contact() {
        assert!(!finger_on_sensor(0));
        assert!(!finger_on_sensor(-200));
    }

    #[test]
    fn strong_signal_reads_as_contact() {
        assert!(finger_on_sensor(600));
    }
}
