/// `HH:MM:SS` / `HH:MM:SS.mmm` rendering shared by the transport display,
/// the tag list and the CSV export.
pub fn format_hms(seconds: f64, with_millis: bool) -> String {
    let total = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    if with_millis {
        // Derive every component from rounded milliseconds so values such as
        // 12.340 (stored as 12.33999...) do not truncate to .339, and the
        // round carries into the seconds.
        let total_ms = (total * 1000.0).round() as u64;
        let h = total_ms / 3_600_000;
        let m = total_ms % 3_600_000 / 60_000;
        let s = total_ms % 60_000 / 1000;
        format!("{:02}:{:02}:{:02}.{:03}", h, m, s, total_ms % 1000)
    } else {
        let h = (total / 3600.0).floor() as u64;
        let m = ((total % 3600.0) / 60.0).floor() as u64;
        let s = (total % 60.0).floor() as u64;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }
}

/// Short `MM:SS` form used by the timeline ruler labels.
pub fn format_ruler(seconds: f64) -> String {
    let total = seconds.max(0.0);
    let minutes = (total / 60.0).floor() as u64;
    let secs = (total % 60.0).floor() as u64;
    format!("{:02}:{:02}", minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0.0, false), "00:00:00");
        assert_eq!(format_hms(12.340, true), "00:00:12.340");
        assert_eq!(format_hms(3725.5, false), "01:02:05");
        assert_eq!(format_hms(3725.5, true), "01:02:05.500");
    }

    #[test]
    fn test_format_hms_millisecond_rounding() {
        // Values whose nearest f64 sits just below the decimal they were
        // entered as must still render that decimal.
        assert_eq!(format_hms(12.340, true), "00:00:12.340");
        assert_eq!(format_hms(45.010, true), "00:00:45.010");
        // Rounding carries across the seconds boundary.
        assert_eq!(format_hms(59.9996, true), "00:01:00.000");
    }

    #[test]
    fn test_format_hms_guards_bad_input() {
        assert_eq!(format_hms(-3.0, true), "00:00:00.000");
        assert_eq!(format_hms(f64::NAN, false), "00:00:00");
    }

    #[test]
    fn test_format_ruler() {
        assert_eq!(format_ruler(0.0), "00:00");
        assert_eq!(format_ruler(95.0), "01:35");
        assert_eq!(format_ruler(600.0), "10:00");
    }
}
