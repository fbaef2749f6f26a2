//! Lightweight markdown → HTML renderer for pipeline output.
//!
//! Handles the subset of markdown that AI models actually produce:
//! - `# Heading` through `#### Heading`
//! - `**bold**`
//! - `- bullet` and `* bullet` list items
//! - `[text](url)` links (http/https only)
//! - `` `inline code` ``
//! - Paragraphs separated by blank lines
//!
//! Everything else is escaped, so model output can never inject markup.

/// Render markdown text to an HTML fragment.
pub fn render_markdown(text: &str) -> String {
    let mut out = String::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_list = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush_paragraph(&mut out, &mut paragraph);
            close_list(&mut out, &mut in_list);
            continue;
        }

        if let Some((level, rest)) = heading(trimmed) {
            flush_paragraph(&mut out, &mut paragraph);
            close_list(&mut out, &mut in_list);
            out.push_str(&format!("<h{0}>{1}</h{0}>\n", level, render_inline(rest)));
            continue;
        }

        let bullet = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "));
        if let Some(rest) = bullet {
            flush_paragraph(&mut out, &mut paragraph);
            if !in_list {
                out.push_str("<ul>\n");
                in_list = true;
            }
            out.push_str(&format!("<li>{}</li>\n", render_inline(rest)));
            continue;
        }

        close_list(&mut out, &mut in_list);
        paragraph.push(trimmed);
    }

    flush_paragraph(&mut out, &mut paragraph);
    close_list(&mut out, &mut in_list);
    out
}

fn heading(line: &str) -> Option<(usize, &str)> {
    ["#### ", "### ", "## ", "# "]
        .iter()
        .find_map(|prefix| line.strip_prefix(*prefix).map(|rest| (prefix.len() - 1, rest)))
}

fn flush_paragraph(out: &mut String, lines: &mut Vec<&str>) {
    if lines.is_empty() {
        return;
    }
    let body = lines
        .iter()
        .map(|l| render_inline(l))
        .collect::<Vec<_>>()
        .join("<br>\n");
    out.push_str(&format!("<p>{}</p>\n", body));
    lines.clear();
}

fn close_list(out: &mut String, in_list: &mut bool) {
    if *in_list {
        out.push_str("</ul>\n");
        *in_list = false;
    }
}

/// Render a single line with inline formatting: **bold**, `code`, [links](url).
fn render_inline(text: &str) -> String {
    let mut out = String::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        match find_next_marker(remaining) {
            None => {
                out.push_str(&escape_html(remaining));
                break;
            }
            Some((pos, MarkerKind::Bold)) => {
                out.push_str(&escape_html(&remaining[..pos]));
                remaining = &remaining[pos + 2..];
                if let Some(end) = remaining.find("**") {
                    out.push_str(&format!("<strong>{}</strong>", escape_html(&remaining[..end])));
                    remaining = &remaining[end + 2..];
                } else {
                    // Unclosed, emit as-is
                    out.push_str(&escape_html(&format!("**{}", remaining)));
                    break;
                }
            }
            Some((pos, MarkerKind::Code)) => {
                out.push_str(&escape_html(&remaining[..pos]));
                remaining = &remaining[pos + 1..];
                if let Some(end) = remaining.find('`') {
                    out.push_str(&format!("<code>{}</code>", escape_html(&remaining[..end])));
                    remaining = &remaining[end + 1..];
                } else {
                    out.push_str(&escape_html(&format!("`{}", remaining)));
                    break;
                }
            }
            Some((pos, MarkerKind::Link)) => {
                out.push_str(&escape_html(&remaining[..pos]));
                remaining = &remaining[pos + 1..];
                // find_next_marker guarantees a "](" follows
                let Some(close_bracket) = remaining.find("](") else {
                    out.push_str(&escape_html(&format!("[{}", remaining)));
                    break;
                };
                let link_text = &remaining[..close_bracket];
                let after = &remaining[close_bracket + 2..];
                match after.find(')') {
                    Some(close_paren) => {
                        let url = after[..close_paren].trim();
                        if is_safe_url(url) {
                            out.push_str(&format!(
                                "<a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>",
                                escape_html(url),
                                escape_html(link_text)
                            ));
                        } else {
                            out.push_str(&escape_html(link_text));
                        }
                        remaining = &after[close_paren + 1..];
                    }
                    None => {
                        // Malformed, emit as-is
                        out.push_str(&escape_html(&format!("[{}]({}", link_text, after)));
                        break;
                    }
                }
            }
        }
    }

    out
}

#[derive(Debug, Clone, Copy)]
enum MarkerKind {
    Bold, // **
    Code, // `
    Link, // [
}

/// Find the next inline marker in the text.
fn find_next_marker(text: &str) -> Option<(usize, MarkerKind)> {
    let mut best: Option<(usize, MarkerKind)> = None;
    let mut consider = |pos: usize, kind: MarkerKind| {
        if best.map_or(true, |(b, _)| pos < b) {
            best = Some((pos, kind));
        }
    };

    if let Some(pos) = text.find("**") {
        consider(pos, MarkerKind::Bold);
    }
    if let Some(pos) = text.find('`') {
        consider(pos, MarkerKind::Code);
    }
    if let Some(pos) = text.find('[') {
        // Only a link if followed by ]( somewhere
        if text[pos..].contains("](") {
            consider(pos, MarkerKind::Link);
        }
    }

    best
}

fn is_safe_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

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
