use once_cell::sync::Lazy;
use pulldown_cmark::{ html, Event, Options, Parser };
use regex::Regex;
use std::fmt;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"));

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full CommonMark rendering. Raw HTML coming from the model is shown as text.
pub fn render_markdown(text: &str) -> Result<String, fmt::Error> {
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::write_html_fmt(&mut out, parser)?;
    Ok(out)
}

/// Minimal renderer: `**bold**`, `- ` list items and blank-line separated paragraphs.
pub fn render_simple_markdown(text: &str) -> String {
    let mut out = String::new();
    for block in text.split("\n\n") {
        if block.trim().is_empty() {
            continue;
        }
        let lines: Vec<&str> = block.lines().collect();
        if !lines.iter().any(|l| list_item(l).is_some()) {
            let body = lines.iter().map(|l| inline(l)).collect::<Vec<_>>().join("\n");
            out.push_str(&format!("<p>{}</p>", body));
            continue;
        }

        out.push_str("<div>");
        let mut in_list = false;
        for line in lines {
            match list_item(line) {
                Some(item) => {
                    if !in_list {
                        out.push_str("<ul>");
                        in_list = true;
                    }
                    out.push_str(&format!("<li>{}</li>", inline(item)));
                }
                None => {
                    if in_list {
                        out.push_str("</ul>");
                        in_list = false;
                    }
                    if !line.trim().is_empty() {
                        out.push_str(&format!("<p>{}</p>", inline(line)));
                    }
                }
            }
        }
        if in_list {
            out.push_str("</ul>");
        }
        out.push_str("</div>");
    }
    out
}

fn list_item(line: &str) -> Option<&str> {
    line.trim_start().strip_prefix("- ")
}

fn inline(text: &str) -> String {
    BOLD.replace_all(&escape_html(text), "<strong>$1</strong>").into_owned()
}
