//! Device-level error codes and the facility that collects them.
//!
//! Sensor setup never fails outright. A role whose sensor cannot be found is
//! reported here and the device keeps running without it; deciding whether a
//! missing sensor is fatal is left to whoever consumes the [`ErrorLog`].

/// Error codes raised by the sensor subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
#[repr(u8)]
pub enum ErrorKind {
    AmbientHumiditySensorNotFound,
    IntakeHumiditySensorNotFound,
    DesiccantHumiditySensorNotFound,
    OutputHumiditySensorNotFound,
    OutPressureSensorNotFound,
    ColorSensorNotFound,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 6] = [
        ErrorKind::AmbientHumiditySensorNotFound,
        ErrorKind::IntakeHumiditySensorNotFound,
        ErrorKind::DesiccantHumiditySensorNotFound,
        ErrorKind::OutputHumiditySensorNotFound,
        ErrorKind::OutPressureSensorNotFound,
        ErrorKind::ColorSensorNotFound,
    ];

    fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

/// Sink for error reports.
pub trait ErrorReporter {
    fn report(&mut self, kind: ErrorKind);
}

/// The set of raised error codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorLog {
    raised: u32,
    reports: u32,
}

impl ErrorLog {
    pub const fn new() -> Self {
        Self {
            raised: 0,
            reports: 0,
        }
    }

    pub fn is_set(&self, kind: ErrorKind) -> bool {
        self.raised & kind.bit() != 0
    }

    /// Number of distinct error codes raised.
    pub fn len(&self) -> usize {
        self.raised.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.raised == 0
    }

    /// Total number of reports received, counting repeats.
    pub fn reports(&self) -> u32 {
        self.reports
    }

    pub fn iter(&self) -> impl Iterator<Item = ErrorKind> + '_ {
        ErrorKind::ALL.into_iter().filter(|k| self.is_set(*k))
    }

    pub fn clear(&mut self, kind: ErrorKind) {
        self.raised &= !kind.bit();
    }
}

impl ErrorReporter for ErrorLog {
    fn report(&mut self, kind: ErrorKind) {
        defmt::error!("Error raised: {:?}", kind);
        self.raised |= kind.bit();
        self.reports = self.reports.saturating_add(1);
    }
}

impl defmt::Format for ErrorLog {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[");
        for (i, kind) in self.iter().enumerate() {
            if i > 0 {
                defmt::write!(f, ", ");
            }
            defmt::write!(f, "{:?}", kind);
        }
        defmt::write!(f, "]");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_log_has_nothing_raised() {
        let log = ErrorLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert_eq!(log.iter().count(), 0);
    }

    #[test]
    fn report_sets_kind_and_counts() {
        let mut log = ErrorLog::new();
        log.report(ErrorKind::ColorSensorNotFound);
        log.report(ErrorKind::DesiccantHumiditySensorNotFound);
        log.report(ErrorKind::ColorSensorNotFound);

        assert!(log.is_set(ErrorKind::ColorSensorNotFound));
        assert!(log.is_set(ErrorKind::DesiccantHumiditySensorNotFound));
        assert!(!log.is_set(ErrorKind::AmbientHumiditySensorNotFound));
        assert_eq!(log.len(), 2);
        assert_eq!(log.reports(), 3);
        assert_eq!(
            log.iter().collect::<Vec<_>>(),
            vec![
                ErrorKind::DesiccantHumiditySensorNotFound,
                ErrorKind::ColorSensorNotFound
            ]
        );
    }

    #[test]
    fn clear_drops_only_that_kind() {
        let mut log = ErrorLog::new();
        log.report(ErrorKind::OutPressureSensorNotFound);
        log.report(ErrorKind::IntakeHumiditySensorNotFound);
        log.clear(ErrorKind::OutPressureSensorNotFound);
        assert!(!log.is_set(ErrorKind::OutPressureSensorNotFound));
        assert!(log.is_set(ErrorKind::IntakeHumiditySensorNotFound));
    }
}
