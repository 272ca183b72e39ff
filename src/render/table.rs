//! Simple grid layout for structured-table nodes.
//!
//! Rows split on `\\`, cells on `&`, both at brace depth zero. `\hline` is
//! dropped and a `none` cell is left blank, which is how Young diagrams mark
//! skew shapes. Column specs and tableau options are read but ignored.

use super::escape_html;
use crate::parser::{command_name, environment, spaced_braced, spaced_bracketed, split_top_level};

/// Lay out a table shorthand, or `None` if the text is not one.
pub fn layout_table(source: &str) -> Option<String> {
    let (kind, body) = table_body(source.trim())?;

    let mut html = format!("<table class=\"latextable {}\">\n", kind);
    for row in split_top_level(body, "\\\\") {
        let row = row.replace("\\hline", "");
        let row = row.trim();
        if row.is_empty() {
            continue;
        }
        html.push_str("<tr>");
        for cell in split_top_level(row, "&") {
            match cell.trim() {
                "none" => html.push_str("<td class=\"none\"></td>"),
                text => html.push_str(&format!("<td>{}</td>", escape_html(text))),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>");
    Some(html)
}

fn table_body(source: &str) -> Option<(&str, &str)> {
    if let Ok((rest, env)) = environment(source) {
        if !rest.trim().is_empty() {
            return None;
        }
        let body = match env.name {
            "ytableau" => spaced_bracketed(env.body).map_or(env.body, |(rest, _)| rest),
            "array" | "rtabular" => spaced_braced(env.body).ok()?.0,
            _ => return None,
        };
        return Some((env.name, body));
    }

    let (rest, name) = command_name(source).ok()?;
    if name != "ytab" {
        return None;
    }
    let (rest, body) = spaced_braced(rest).ok()?;
    rest.trim().is_empty().then_some(("ytab", body))
}
