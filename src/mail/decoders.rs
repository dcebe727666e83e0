use anyhow::Result;
use mailparse::{MailHeaderMap, ParsedMail};

/// Wrap width for HTML bodies rendered to text.
const HTML_TEXT_WIDTH: usize = 200;

/// Header fields the store needs before a body is ever read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSummary {
    pub subject: String,
    /// Seconds since the epoch, from the `Date` header.
    pub date_epoch: Option<i64>,
}

/// Reads subject and date from the header block of a raw RFC 822 message.
pub fn read_headers(raw: &[u8]) -> Result<HeaderSummary> {
    let (headers, _body_offset) = mailparse::parse_headers(raw)?;
    let subject = headers
        .get_first_value("Subject") // decodes RFC 2047
        .map(|s| unfold(&s))
        .unwrap_or_default();
    let date_epoch = headers
        .get_first_value("Date")
        .and_then(|d| mailparse::dateparse(&d).ok());
    Ok(HeaderSummary {
        subject,
        date_epoch,
    })
}

/// Folded header continuations can leave line breaks behind.
fn unfold(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("")
        .trim_end()
        .to_string()
}

/// Plain-text body of a raw message: the first `text/plain` part, else the
/// first HTML part rendered to text, else the top-level body.
pub fn extract_body_text(raw: &[u8]) -> Result<String> {
    let parsed = mailparse::parse_mail(raw)?;
    if let Some(text) = find_part(&parsed, "text/plain") {
        return Ok(text);
    }
    if let Some(html) = find_part(&parsed, "text/html") {
        return Ok(html_to_text(&html));
    }
    Ok(parsed.get_body()?)
}

fn find_part(p: &ParsedMail, mimetype: &str) -> Option<String> {
    if p.ctype.mimetype.eq_ignore_ascii_case(mimetype) && !is_attachment(p) {
        return p.get_body().ok();
    }
    p.subparts.iter().find_map(|sp| find_part(sp, mimetype))
}

fn is_attachment(p: &ParsedMail) -> bool {
    matches!(
        p.get_content_disposition().disposition,
        mailparse::DispositionType::Attachment
    )
}

fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), HTML_TEXT_WIDTH)
        .unwrap_or_else(|_| strip_tags(html))
}

fn strip_tags(html: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}
