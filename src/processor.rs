use std::io::Write;

use anyhow::Result;
use log::{error, warn};

use crate::domain::email::{Keywords, ParsedEmail};
use crate::domain::filter::SearchMode;
use crate::mail::parser::parse_email_body;
use crate::store::repo::MailMessage;

pub struct ProcessOptions {
    pub mode: SearchMode,
    /// Literal text the body must contain; `None` disables the check.
    pub ip_filter: Option<String>,
    pub keywords: Keywords,
}

impl ProcessOptions {
    /// `none` (any case) or an empty value disables the IP filter.
    pub fn ip_filter_arg(value: &str) -> Option<String> {
        let value = value.trim();
        (!value.is_empty() && !value.eq_ignore_ascii_case("none")).then(|| value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoComputerName,
    IpFilterMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Parsed(ParsedEmail),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub matched: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Leading non-whitespace run of the subject, if the subject starts with one.
pub fn computer_name(subject: &str) -> Option<&str> {
    subject
        .split(char::is_whitespace)
        .next()
        .filter(|token| !token.is_empty())
}

/// Everything for one message short of emitting it.
pub fn process_message<M: MailMessage>(
    message: &M,
    options: &ProcessOptions,
) -> Result<MessageOutcome> {
    let subject = message.subject();
    let Some(name) = computer_name(subject) else {
        warn!("Could not parse computer name from subject: '{subject}'. Skipping email.");
        return Ok(MessageOutcome::Skipped(SkipReason::NoComputerName));
    };

    let body = message.body()?;
    if let Some(ip) = &options.ip_filter
        && !body.contains(ip.as_str())
    {
        return Ok(MessageOutcome::Skipped(SkipReason::IpFilterMismatch));
    }

    let fields = parse_email_body(&body, &options.keywords);
    Ok(MessageOutcome::Parsed(ParsedEmail::new(name, fields)))
}

/// Runs every message through [`process_message`], writing one record line
/// per parsed message to `out`. A failing message is logged and counted,
/// never fatal.
pub fn process_batch<M: MailMessage, W: Write>(
    messages: Vec<M>,
    options: &ProcessOptions,
    out: &mut W,
) -> BatchSummary {
    let mut summary = BatchSummary {
        matched: messages.len(),
        ..BatchSummary::default()
    };

    for mut message in messages {
        let parsed = match process_message(&message, options) {
            Ok(MessageOutcome::Parsed(parsed)) => parsed,
            Ok(MessageOutcome::Skipped(_)) => {
                summary.skipped += 1;
                continue;
            }
            Err(e) => {
                error!(
                    "Failed to process email with subject '{}'. Error: {e:#}",
                    message.subject()
                );
                summary.failed += 1;
                continue;
            }
        };

        if let Err(e) = writeln!(out, "{parsed}") {
            error!(
                "Failed to process email with subject '{}'. Error: {e}",
                message.subject()
            );
            summary.failed += 1;
            continue;
        }
        summary.processed += 1;

        if options.mode == SearchMode::Unread
            && let Err(e) = message.mark_read()
        {
            error!(
                "Failed to process email with subject '{}'. Error: {e:#}",
                message.subject()
            );
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture::logged;
    use anyhow::anyhow;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeMessage {
        subject: String,
        body: Option<String>,
        unread: bool,
        fail_mark: bool,
        marks: Rc<Cell<usize>>,
    }

    impl FakeMessage {
        fn new(subject: &str, body: &str) -> Self {
            Self {
                subject: subject.to_string(),
                body: Some(body.to_string()),
                unread: true,
                fail_mark: false,
                marks: Rc::new(Cell::new(0)),
            }
        }
    }

    impl MailMessage for FakeMessage {
        fn subject(&self) -> &str {
            &self.subject
        }

        fn body(&self) -> Result<String> {
            self.body.clone().ok_or_else(|| anyhow!("body unavailable"))
        }

        fn received(&self) -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 1, 10)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap()
        }

        fn is_unread(&self) -> bool {
            self.unread
        }

        fn mark_read(&mut self) -> Result<()> {
            if self.fail_mark {
                return Err(anyhow!("store is read-only"));
            }
            self.unread = false;
            self.marks.set(self.marks.get() + 1);
            Ok(())
        }
    }

    fn options(mode: SearchMode, ip: &str) -> ProcessOptions {
        ProcessOptions {
            mode,
            ip_filter: ProcessOptions::ip_filter_arg(ip),
            keywords: Keywords::default(),
        }
    }

    const REPORT: &str = "Serial Number: ABC999\n\
                          Time to reimage: 45 minutes\n\
                          The following 2 items failed to install: Java, SAP GUI\n\
                          Host IP: 10.20.30.40\n";

    fn run(messages: Vec<FakeMessage>, opts: &ProcessOptions) -> (BatchSummary, String) {
        let mut out = Vec::new();
        let summary = process_batch(messages, opts, &mut out);
        (summary, String::from_utf8(out).unwrap())
    }

    #[test]
    fn computer_name_is_leading_token() {
        assert_eq!(computer_name("PC-123 Reimage Complete"), Some("PC-123"));
        assert_eq!(computer_name("LAB07"), Some("LAB07"));
        assert_eq!(computer_name(""), None);
        assert_eq!(computer_name(" PC-1 leading space"), None);
    }

    #[test]
    fn end_to_end_record() {
        let opts = options(SearchMode::Date, "none");
        let (summary, out) = run(vec![FakeMessage::new("PC-123 Reimage Complete", REPORT)], &opts);
        assert_eq!(
            out,
            "PARSED_EMAIL:PC-123_||_ABC999_||_45 minutes_||_2 items (from summary)\n"
        );
        assert_eq!(summary.processed, 1);
    }

    #[test]
    fn empty_subject_is_skipped_and_not_counted() {
        let opts = options(SearchMode::Date, "none");
        let (summary, out) = run(
            vec![FakeMessage::new("", REPORT), FakeMessage::new("PC-2 ok", REPORT)],
            &opts,
        );
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(out.lines().count(), 1);
        assert!(out.starts_with("PARSED_EMAIL:PC-2_||_"));
    }

    #[test]
    fn ip_filter_mismatch_is_skipped() {
        let opts = options(SearchMode::Date, "192.168.1.");
        let (summary, out) = run(vec![FakeMessage::new("PC-1 done", REPORT)], &opts);
        assert_eq!(summary.processed, 0);
        assert_eq!(summary.skipped, 1);
        assert!(out.is_empty());

        let opts = options(SearchMode::Date, "10.20.");
        let (summary, _) = run(vec![FakeMessage::new("PC-1 done", REPORT)], &opts);
        assert_eq!(summary.processed, 1);
    }

    #[test]
    fn empty_subject_is_logged_as_a_warning() {
        let opts = options(SearchMode::Date, "none");
        let ((summary, _), lines) = logged(|| run(vec![FakeMessage::new("", REPORT)], &opts));
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            lines,
            vec!["LOG:WARN:Could not parse computer name from subject: ''. Skipping email."]
        );
    }

    #[test]
    fn ip_filter_mismatch_is_silent() {
        let opts = options(SearchMode::Date, "192.168.1.");
        let ((summary, _), lines) =
            logged(|| run(vec![FakeMessage::new("PC-1 done", REPORT)], &opts));
        assert_eq!(summary.skipped, 1);
        assert!(lines.is_empty());
    }

    #[test]
    fn failing_message_is_logged_with_its_subject() {
        let mut broken = FakeMessage::new("PC-1 broken", "");
        broken.body = None;
        let opts = options(SearchMode::Date, "none");
        let (_, lines) = logged(|| run(vec![broken], &opts));
        assert_eq!(
            lines,
            vec!["LOG:ERROR:Failed to process email with subject 'PC-1 broken'. Error: body unavailable"]
        );
    }

    #[test]
    fn failing_message_does_not_abort_batch() {
        let mut broken = FakeMessage::new("PC-1 broken", "");
        broken.body = None;
        let opts = options(SearchMode::Date, "none");
        let (summary, out) = run(vec![broken, FakeMessage::new("PC-2 fine", REPORT)], &opts);
        assert_eq!(
            summary,
            BatchSummary {
                matched: 2,
                processed: 1,
                skipped: 0,
                failed: 1,
            }
        );
        assert!(out.starts_with("PARSED_EMAIL:PC-2_||_ABC999"));
    }

    #[test]
    fn unread_mode_marks_messages_read() {
        let message = FakeMessage::new("PC-1 done", REPORT);
        let marks = message.marks.clone();
        let (summary, _) = run(vec![message], &options(SearchMode::Unread, "none"));
        assert_eq!(summary.processed, 1);
        assert_eq!(marks.get(), 1);
    }

    #[test]
    fn other_modes_leave_read_state_alone() {
        let message = FakeMessage::new("PC-1 done", REPORT);
        let marks = message.marks.clone();
        run(vec![message], &options(SearchMode::Range, "none"));
        assert_eq!(marks.get(), 0);
    }

    #[test]
    fn skipped_messages_are_not_marked() {
        let message = FakeMessage::new("", REPORT);
        let marks = message.marks.clone();
        run(vec![message], &options(SearchMode::Unread, "none"));
        assert_eq!(marks.get(), 0);
    }

    #[test]
    fn mark_read_failure_keeps_the_record() {
        let mut message = FakeMessage::new("PC-1 done", REPORT);
        message.fail_mark = true;
        let opts = options(SearchMode::Unread, "none");
        let (summary, out) = run(vec![message], &opts);
        assert_eq!(summary.processed, 1);
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn ip_filter_arg_parsing() {
        assert_eq!(ProcessOptions::ip_filter_arg("none"), None);
        assert_eq!(ProcessOptions::ip_filter_arg("NONE"), None);
        assert_eq!(ProcessOptions::ip_filter_arg(""), None);
        assert_eq!(
            ProcessOptions::ip_filter_arg("10.0."),
            Some("10.0.".to_string())
        );
    }
}
