//! Second pass: rewritten page trees to HTML.
//!
//! Rendering needs the merged label and record indexes, so no page can be
//! rendered before the merge has run over every artifact.

pub mod html;
pub mod math;
mod table;
mod template;

pub use html::{render_page, RenderContext, RenderedPage};
pub use math::{MathBackend, MathRenderer};
pub use table::layout_table;
pub use template::{Template, PLACEHOLDERS};

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
