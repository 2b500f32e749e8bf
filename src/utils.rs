use std::time::Duration;

/// Format a `Duration` with automatic unit scaling, e.g. `1.94ms`, `2.34s`.
pub fn fmt_duration(d: Duration) -> String {
    format!("{d:.2?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_units() {
        assert_eq!(fmt_duration(Duration::from_micros(1940)), "1.94ms");
        assert_eq!(fmt_duration(Duration::from_millis(2340)), "2.34s");
    }
}
