use std::fmt;

/// Display fields of a duration. Hours are unbounded.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FormattedTime {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub hundredths: u64,
}

impl fmt::Display for FormattedTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}.{:02}",
            self.hours, self.minutes, self.seconds, self.hundredths
        )
    }
}

/// Split milliseconds into hours, minutes, seconds and hundredths.
pub fn format(ms: u64) -> FormattedTime {
    let total_secs = ms / 1000;
    FormattedTime {
        hours: total_secs / 3600,
        minutes: (total_secs % 3600) / 60,
        seconds: total_secs % 60,
        hundredths: (ms % 1000) / 10,
    }
}

/// Format milliseconds as "HH:MM:SS"
pub fn format_hms(ms: u64) -> String {
    let t = format(ms);
    format!("{:02}:{:02}:{:02}", t.hours, t.minutes, t.seconds)
}

/// Format milliseconds as "HH:MM:SS.cs" (centiseconds)
pub fn format_hms_cs(ms: u64) -> String {
    format(ms).to_string()
}

/// Format one lap entry. `index` is zero-based, the label is one-based.
pub fn format_lap(index: usize, ms: u64) -> String {
    format!("Lap {}: {}", index + 1, format(ms))
}
