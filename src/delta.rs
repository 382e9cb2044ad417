/// Per-interval metric computation
use crate::report::EntityRecord;
use crate::{Metric, MetricValue};

/// Metric names, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricName {
    RequestsQueued,
    RequestsQueueLimit,
    RequestsHandled,
    RequestsAbortedByClient,
    RequestsAbortedByServer,
    Sessions,
    SessionLimit,
    BytesIn,
    BytesOut,
    Warnings,
    Errors,
    FailedHealthChecks,
    DowntimeSeconds,
    Responses1xx,
    Responses2xx,
    Responses3xx,
    Responses4xx,
    Responses5xx,
    ResponsesOther,
}

impl MetricName {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricName::RequestsQueued => "HAPROXY_REQUESTS_QUEUED",
            MetricName::RequestsQueueLimit => "HAPROXY_REQUESTS_QUEUE_LIMIT",
            MetricName::RequestsHandled => "HAPROXY_REQUESTS_HANDLED",
            MetricName::RequestsAbortedByClient => "HAPROXY_REQUESTS_ABORTED_BY_CLIENT",
            MetricName::RequestsAbortedByServer => "HAPROXY_REQUESTS_ABORTED_BY_SERVER",
            MetricName::Sessions => "HAPROXY_SESSIONS",
            MetricName::SessionLimit => "HAPROXY_SESSION_LIMIT",
            MetricName::BytesIn => "HAPROXY_BYTES_IN",
            MetricName::BytesOut => "HAPROXY_BYTES_OUT",
            MetricName::Warnings => "HAPROXY_WARNINGS",
            MetricName::Errors => "HAPROXY_ERRORS",
            MetricName::FailedHealthChecks => "HAPROXY_FAILED_HEALTH_CHECKS",
            MetricName::DowntimeSeconds => "HAPROXY_DOWNTIME_SECONDS",
            MetricName::Responses1xx => "HAPROXY_1XX_RESPONSES",
            MetricName::Responses2xx => "HAPROXY_2XX_RESPONSES",
            MetricName::Responses3xx => "HAPROXY_3XX_RESPONSES",
            MetricName::Responses4xx => "HAPROXY_4XX_RESPONSES",
            MetricName::Responses5xx => "HAPROXY_5XX_RESPONSES",
            MetricName::ResponsesOther => "HAPROXY_OTHER_RESPONSES",
        }
    }
}

const WARNING_FIELDS: [&str; 2] = ["wretr", "wredis"];

const ERROR_FIELDS: [&str; 3] = ["ereq", "econ", "eresp"];

const RESPONSE_FIELDS: [(MetricName, &str); 6] = [
    (MetricName::Responses1xx, "hrsp_1xx"),
    (MetricName::Responses2xx, "hrsp_2xx"),
    (MetricName::Responses3xx, "hrsp_3xx"),
    (MetricName::Responses4xx, "hrsp_4xx"),
    (MetricName::Responses5xx, "hrsp_5xx"),
    (MetricName::ResponsesOther, "hrsp_other"),
];

/// Non-negative difference; 0 when either side is missing.
/// Counter resets (HAProxy restart) therefore report 0 instead of going negative.
pub fn delta(current: Option<i64>, previous: Option<i64>) -> i64 {
    match (current, previous) {
        (Some(a), Some(b)) => a.saturating_sub(b).max(0),
        _ => 0,
    }
}

/// `current / limit`, 0.0 when either operand is missing or zero
pub fn ratio(current: Option<i64>, limit: Option<i64>) -> f64 {
    match (current, limit) {
        (Some(cur), Some(lim)) if cur != 0 && lim != 0 => cur as f64 / lim as f64,
        _ => 0.0,
    }
}

/// Sum of several counters, absent ones counting as 0
pub fn sum(record: &EntityRecord, keys: &[&str]) -> i64 {
    keys.iter()
        .map(|key| record.integer(key).unwrap_or(0))
        .fold(0i64, i64::saturating_add)
}

/// Difference of one field between polls; 0 when there is no previous record
fn field_delta(current: &EntityRecord, previous: Option<&EntityRecord>, key: &str) -> i64 {
    match previous {
        Some(prev) => delta(current.integer(key), prev.integer(key)),
        None => 0,
    }
}

/// Difference of a summed group of fields; summed before differencing
fn composite_delta(current: &EntityRecord, previous: Option<&EntityRecord>, keys: &[&str]) -> i64 {
    match previous {
        Some(prev) => delta(Some(sum(current, keys)), Some(sum(prev, keys))),
        None => 0,
    }
}

/// Compute every metric for one proxy and append them to `out`.
///
/// `previous` is None on the first poll that saw this proxy; every
/// difference-based metric is then 0 rather than the raw counter.
pub fn compute_metrics(
    entity: &str,
    current: &EntityRecord,
    previous: Option<&EntityRecord>,
    out: &mut Vec<Metric>,
) {
    let mut push = |name: MetricName, value: MetricValue| {
        out.push(Metric {
            name,
            value,
            entity: entity.to_string(),
        });
    };
    let count = |key: &str| MetricValue::Count(field_delta(current, previous, key));

    push(
        MetricName::RequestsQueued,
        MetricValue::Count(current.integer("qcur").unwrap_or(0)),
    );
    push(
        MetricName::RequestsQueueLimit,
        MetricValue::Ratio(ratio(current.integer("qcur"), current.integer("qlimit"))),
    );

    push(MetricName::RequestsHandled, count("req_tot"));
    push(MetricName::RequestsAbortedByClient, count("cli_abrt"));
    push(MetricName::RequestsAbortedByServer, count("srv_abrt"));

    push(
        MetricName::Sessions,
        MetricValue::Count(current.integer("scur").unwrap_or(0)),
    );
    push(
        MetricName::SessionLimit,
        MetricValue::Ratio(ratio(current.integer("scur"), current.integer("slim"))),
    );

    push(MetricName::BytesIn, count("bin"));
    push(MetricName::BytesOut, count("bout"));

    push(
        MetricName::Warnings,
        MetricValue::Count(composite_delta(current, previous, &WARNING_FIELDS)),
    );
    push(
        MetricName::Errors,
        MetricValue::Count(composite_delta(current, previous, &ERROR_FIELDS)),
    );
    push(MetricName::FailedHealthChecks, count("chkfail"));
    push(MetricName::DowntimeSeconds, count("downtime"));

    for &(name, key) in &RESPONSE_FIELDS {
        push(name, count(key));
    }
}
