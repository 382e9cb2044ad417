/// Metric line rendering for the collector agent
use std::fmt::Write as _;
use std::io::{self, Write};

use crate::constants::OUTPUT_CAPACITY;
use crate::{Metric, MetricValue};

/// Build one `<NAME> <value> <entity>` line per metric into `out`.
/// The buffer is reused across cycles.
pub fn build_lines(out: &mut String, metrics: &[Metric]) {
    out.clear();
    out.reserve(OUTPUT_CAPACITY);

    for metric in metrics {
        out.push_str(metric.name.as_str());
        out.push(' ');
        // Writing into a String cannot fail
        let _ = match metric.value {
            MetricValue::Count(n) => write!(out, "{}", n),
            // Shortest round-trip form, never rounded to fixed decimals
            MetricValue::Ratio(r) => write!(out, "{}", r),
        };
        out.push(' ');
        out.push_str(&metric.entity);
        out.push('\n');
    }
}

/// Write a rendered cycle in one go and flush.
pub fn write_lines<W: Write>(writer: &mut W, lines: &str) -> io::Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    writer.write_all(lines.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delta::MetricName;
    use pretty_assertions::assert_eq;

    fn metric(name: MetricName, value: MetricValue, entity: &str) -> Metric {
        Metric {
            name,
            value,
            entity: entity.to_string(),
        }
    }

    #[test]
    fn test_build_lines_formats_counts_and_ratios() {
        let metrics = vec![
            metric(MetricName::RequestsQueued, MetricValue::Count(3), "host1-web"),
            metric(MetricName::RequestsQueueLimit, MetricValue::Ratio(0.0), "host1-web"),
            metric(MetricName::SessionLimit, MetricValue::Ratio(0.25), "host1-web"),
        ];
        let mut out = String::new();
        build_lines(&mut out, &metrics);
        assert_eq!(
            out,
            "HAPROXY_REQUESTS_QUEUED 3 host1-web\n\
             HAPROXY_REQUESTS_QUEUE_LIMIT 0 host1-web\n\
             HAPROXY_SESSION_LIMIT 0.25 host1-web\n"
        );
    }

    #[test]
    fn test_small_ratio_not_rounded_to_zero() {
        let r = crate::delta::ratio(Some(100), Some(262144));
        let metrics = vec![metric(MetricName::SessionLimit, MetricValue::Ratio(r), "web")];
        let mut out = String::new();
        build_lines(&mut out, &metrics);

        assert_eq!(out, "HAPROXY_SESSION_LIMIT 0.0003814697265625 web\n");
        let printed: f64 = out.split(' ').nth(1).unwrap().parse().unwrap();
        assert!(printed > 0.0);
    }

    #[test]
    fn test_build_lines_reuses_buffer() {
        let mut out = String::from("stale\n");
        build_lines(&mut out, &[]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_lines() {
        let mut sink = Vec::new();
        write_lines(&mut sink, "HAPROXY_SESSIONS 1 web\n").unwrap();
        assert_eq!(sink, b"HAPROXY_SESSIONS 1 web\n");
    }

    #[test]
    fn test_write_nothing_for_empty_cycle() {
        let mut sink = Vec::new();
        write_lines(&mut sink, "").unwrap();
        assert!(sink.is_empty());
    }
}
