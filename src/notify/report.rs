use tracing::debug;

use crate::notify::channel::ChannelKind;
use crate::notify::dispatcher::DispatchReport;
use crate::notify::outcome::Outcome;

/// What the process prints and how it exits after a dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub lines: Vec<String>,
    /// Code of the first failed channel in kind order; `None` when nothing failed.
    pub exit_code: Option<i32>,
}

impl ReportSummary {
    pub fn is_success(&self) -> bool {
        self.exit_code.is_none()
    }
}

pub fn describe(kind: ChannelKind, outcome: &Outcome) -> String {
    let label = kind.label();
    match outcome {
        Outcome::Success => format!("{label} notification success"),
        Outcome::NoTarget => format!("no target for {label}"),
        Outcome::Disabled => format!("{label} notification invalid"),
        Outcome::Failed(failure) => format!("{label} notification failed: {failure}"),
    }
}

/// Builds one line per channel and picks the exit code.
///
/// Lines are returned for the caller to print; they are only traced at debug level so a
/// terminal does not show each outcome twice.
pub fn report(dispatch: &DispatchReport) -> ReportSummary {
    let mut lines = Vec::with_capacity(dispatch.len());
    let mut exit_code = None;

    for (kind, outcome) in dispatch.iter() {
        let line = describe(kind, outcome);
        match outcome {
            Outcome::Failed(failure) => {
                debug!(
                    channel = %kind,
                    category = ?failure.kind.category(),
                    code = failure.kind.exit_code(),
                    "{line}"
                );
                exit_code.get_or_insert(failure.kind.exit_code());
            }
            _ => debug!(channel = %kind, "{line}"),
        }
        lines.push(line);
    }

    ReportSummary { lines, exit_code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::Level;

    use crate::notify::outcome::FailureKind;

    fn dispatch(entries: Vec<(ChannelKind, Outcome)>) -> DispatchReport {
        let mut report = DispatchReport::default();
        for (kind, outcome) in entries {
            report.insert(kind, outcome);
        }
        report
    }

    #[test]
    fn lines_follow_kind_order_and_wording() {
        let summary = report(&dispatch(vec![
            (ChannelKind::SlackWebhook, Outcome::NoTarget),
            (ChannelKind::SlackApi, Outcome::Disabled),
            (ChannelKind::Email, Outcome::Success),
        ]));

        assert_eq!(
            summary.lines,
            [
                "email notification success",
                "slack notification invalid",
                "no target for slack webhook",
            ]
        );
        assert!(summary.is_success());
    }

    #[test]
    fn first_failure_in_kind_order_sets_exit_code() {
        let summary = report(&dispatch(vec![
            (
                ChannelKind::SlackWebhook,
                Outcome::failed(FailureKind::WebhookChannelNotFound, "404"),
            ),
            (
                ChannelKind::Email,
                Outcome::failed(FailureKind::SmtpAuth, "535 denied"),
            ),
        ]));

        assert_eq!(summary.exit_code, Some(14));
        assert_eq!(summary.lines.len(), 2);
        assert_eq!(
            summary.lines[0],
            "email notification failed: SMTP authentication failed: 535 denied"
        );
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn traced_output(level: Level, dispatch: &DispatchReport) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, || report(dispatch));
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn outcome_lines_stay_out_of_info_logs() {
        let dispatch = dispatch(vec![
            (ChannelKind::Email, Outcome::Success),
            (
                ChannelKind::SlackApi,
                Outcome::failed(FailureKind::SlackToken, "invalid_auth"),
            ),
        ]);

        assert_eq!(traced_output(Level::INFO, &dispatch), "");
    }

    #[test]
    fn debug_logs_carry_failure_category() {
        let dispatch = dispatch(vec![(
            ChannelKind::SlackWebhook,
            Outcome::failed(FailureKind::WebhookForbidden, "403"),
        )]);

        let output = traced_output(Level::DEBUG, &dispatch);
        assert!(output.contains("category=Auth"));
        assert!(output.contains("code=42"));
        assert!(output.contains("slack webhook notification failed"));
    }

    #[test]
    fn empty_dispatch_reports_success() {
        let summary = report(&DispatchReport::default());
        assert!(summary.lines.is_empty());
        assert_eq!(summary.exit_code, None);
    }
}
