use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("compass.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("compass.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("compass.client.request_duration_seconds");

pub(crate) static AUTH_LOGINS: Counter = Counter::new("compass.auth.logins");
pub(crate) static AUTH_REGISTRATIONS: Counter = Counter::new("compass.auth.registrations");
pub(crate) static AUTH_FAILURES: Counter = Counter::new("compass.auth.failures");

pub(crate) static WIDGET_SUBMISSIONS: Counter = Counter::new("compass.widget.submissions");
pub(crate) static WIDGET_IGNORED: Counter = Counter::new("compass.widget.ignored");
pub(crate) static WIDGET_FAILURES: Counter = Counter::new("compass.widget.failures");
pub(crate) static WIDGET_STALE_RESPONSES: Counter =
    Counter::new("compass.widget.stale_responses");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&AUTH_LOGINS);
    collector.register_counter(&AUTH_REGISTRATIONS);
    collector.register_counter(&AUTH_FAILURES);

    collector.register_counter(&WIDGET_SUBMISSIONS);
    collector.register_counter(&WIDGET_IGNORED);
    collector.register_counter(&WIDGET_FAILURES);
    collector.register_counter(&WIDGET_STALE_RESPONSES);
}
