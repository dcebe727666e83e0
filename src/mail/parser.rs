use std::sync::LazyLock;

use log::warn;
use regex::Regex;

use crate::domain::email::{BodyFields, Keywords};

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Line boundaries besides `\r\n`: lone CR/LF, VT, FF, the file, group and
/// record separators, NEL and the Unicode line and paragraph separators.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

fn body_lines(body: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = body
        .split("\r\n")
        .flat_map(|chunk| chunk.split(LINE_BREAKS))
        .collect();
    // a trailing break does not open another line
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// "The following 3 items failed to install" style line, if any.
fn summary_count(lines: &[&str]) -> Option<String> {
    lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if lower.contains("the following") && lower.contains("items failed to install") {
            DIGITS
                .find(line)
                .map(|m| format!("{} items (from summary)", m.as_str()))
        } else {
            None
        }
    })
}

/// Itemized `<keyword>\t<app name>` lines, in body order.
fn failed_apps(lines: &[&str], keyword: &str) -> Vec<String> {
    if keyword.is_empty() {
        return Vec::new();
    }
    let keyword = keyword.to_lowercase();
    lines
        .iter()
        .filter(|line| line.trim_start().to_lowercase().starts_with(&keyword))
        .filter_map(|line| line.split('\t').nth(1))
        .map(|app| app.trim().to_string())
        .collect()
}

/// Value after `keyword` on `line`. The containment test ignores case but
/// the split needs the keyword as written, so a line that only matches in
/// another case yields `Err(())`.
fn keyword_value(line: &str, lower_line: &str, keyword: &str) -> Option<Result<String, ()>> {
    if keyword.is_empty() || !lower_line.contains(&keyword.to_lowercase()) {
        return None;
    }
    Some(
        line.split_once(keyword)
            .map(|(_, rest)| rest.trim().to_string())
            .ok_or(()),
    )
}

/// Extracts serial number, reimage time and failed installs from a
/// plain-text body.
pub fn parse_email_body(body: &str, keywords: &Keywords) -> BodyFields {
    let mut data = BodyFields::default();
    let lines = body_lines(body);

    // a summary count beats any itemized list
    if let Some(summary) = summary_count(&lines) {
        data.failed_installs = summary;
    } else {
        let apps = failed_apps(&lines, &keywords.failed);
        if !apps.is_empty() {
            data.failed_installs = apps.join(", ");
        }
    }

    for line in &lines {
        let lower_line = line.to_lowercase();
        let targets = [
            (&keywords.serial, &mut data.serial_number),
            (&keywords.time, &mut data.reimage_time),
        ];
        for (keyword, field) in targets {
            match keyword_value(line, &lower_line, keyword) {
                Some(Ok(value)) => *field = value,
                Some(Err(())) => warn!("Could not parse a keyword line: '{line}'"),
                None => {}
            }
        }
    }

    data
}
