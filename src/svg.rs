//! SVG preview of a composition.
//!
//! Produces a standalone SVG document: white page, elements in paint order,
//! each clipped to its box, an optional bleed guide and a selection ring.
//! Images whose asset failed to load are replaced by a hatched red
//! placeholder naming the missing file.

use std::fmt::Write;

use crate::assets::AssetReport;
use crate::compositor::{Composition, ImageFit, ImageLayout, RenderContent, RenderItem, TextLayout};
use crate::template::TextAlign;

const SELECTION_COLOR: &str = "#6366f1";
const LOCK_COLOR: &str = "#f59e0b";
const BLEED_COLOR: &str = "rgba(239,68,68,0.25)";
const MISSING_COLOR: &str = "#dc2626";

/// Rendering options that depend on session state rather than the template.
#[derive(Debug, Clone, Copy)]
pub struct SvgOptions<'a> {
    pub show_bleed: bool,
    pub selected: Option<&'a str>,
    pub assets: &'a AssetReport,
}

/// Render `composition` to an SVG document.
pub fn render_svg(composition: &Composition, options: &SvgOptions<'_>) -> String {
    let page = &composition.page.screen;
    let mut out = String::new();

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="{x} {y} {w} {h}" data-side="{side}" data-page="{key}">"#,
        w = num(page.width),
        h = num(page.height),
        x = num(page.left),
        y = num(page.top),
        side = composition.side.label(),
        key = escape(&composition.page.key),
    );
    out.push_str(concat!(
        r#"<defs><pattern id="missing-hatch" width="8" height="8" patternUnits="userSpaceOnUse" patternTransform="rotate(45)">"#,
        r##"<rect width="8" height="8" fill="#fef2f2"/><line x1="0" y1="0" x2="0" y2="8" stroke="#fca5a5" stroke-width="4"/>"##,
        "</pattern></defs>\n"
    ));
    let _ = writeln!(
        out,
        r##"<rect class="page" x="{}" y="{}" width="{}" height="{}" fill="#ffffff"/>"##,
        num(page.left),
        num(page.top),
        num(page.width),
        num(page.height)
    );

    for (index, item) in composition.items.iter().enumerate() {
        let selected = options.selected == Some(item.id.as_str());
        write_item(&mut out, index, item, selected, options.assets);
    }

    if options.show_bleed {
        write_bleed(&mut out, composition);
    }

    out.push_str("</svg>\n");
    out
}

fn write_item(out: &mut String, index: usize, item: &RenderItem, selected: bool, assets: &AssetReport) {
    let b = &item.screen;
    let clip_id = format!("clip-{}", index);
    let _ = writeln!(
        out,
        r#"<g class="element" data-id="{}" data-interactive="{}" data-locked="{}">"#,
        escape(&item.id),
        item.interactive,
        item.locked
    );
    let _ = writeln!(
        out,
        r#"<clipPath id="{}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath>"#,
        clip_id,
        num(b.left),
        num(b.top),
        num(b.width),
        num(b.height)
    );

    match &item.content {
        RenderContent::Image(image) if assets.is_missing(&image.src) => {
            write_placeholder(out, item, image);
        }
        RenderContent::Image(image) => {
            let p = &image.placement;
            let aspect = match image.fit {
                ImageFit::Cover => "xMidYMid slice",
                ImageFit::Exact => "none",
            };
            let _ = writeln!(
                out,
                r#"<image href="{}" x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="{}" clip-path="url(#{})"/>"#,
                escape(&image.src),
                num(b.left + p.left),
                num(b.top + p.top),
                num(p.width),
                num(p.height),
                aspect,
                clip_id
            );
        }
        RenderContent::Text(text) => write_text(out, item, text, &clip_id),
    }

    if selected {
        let _ = writeln!(
            out,
            r#"<rect class="selection" x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            num(b.left),
            num(b.top),
            num(b.width),
            num(b.height),
            SELECTION_COLOR
        );
        if item.locked {
            let size = 12.0;
            let _ = writeln!(
                out,
                r##"<g class="lock-badge"><rect x="{}" y="{}" width="{}" height="{}" rx="2" fill="{}"/><title>locked</title></g>"##,
                num(b.right() - size - 3.0),
                num(b.top + 3.0),
                num(size),
                num(size),
                LOCK_COLOR
            );
        }
    }

    out.push_str("</g>\n");
}

fn write_placeholder(out: &mut String, item: &RenderItem, image: &ImageLayout) {
    let b = &item.screen;
    let label = if image.file_name.is_empty() {
        image.src.as_str()
    } else {
        image.file_name.as_str()
    };
    let _ = writeln!(
        out,
        r#"<rect class="missing-asset" x="{}" y="{}" width="{}" height="{}" fill="url(#missing-hatch)" stroke="{}" stroke-width="2" stroke-dasharray="6 3"/>"#,
        num(b.left),
        num(b.top),
        num(b.width),
        num(b.height),
        MISSING_COLOR
    );
    let _ = writeln!(
        out,
        r#"<text x="{}" y="{}" font-family="monospace" font-size="10" fill="{}" text-anchor="middle">missing: {}</text>"#,
        num(b.left + b.width / 2.0),
        num(b.top + b.height / 2.0),
        MISSING_COLOR,
        escape(label)
    );
}

fn write_text(out: &mut String, item: &RenderItem, text: &TextLayout, clip_id: &str) {
    let b = &item.screen;
    let anchor = match text.align {
        TextAlign::Left => "start",
        TextAlign::Center => "middle",
        TextAlign::Right => "end",
    };
    let x = num(b.left + text.anchor_x);
    let _ = write!(
        out,
        r##"<text font-family="{}" font-size="{}" fill="#000000" text-anchor="{}" xml:space="preserve" clip-path="url(#{})">"##,
        escape(&text.font_family),
        num(text.font_size),
        anchor,
        clip_id
    );
    for line in &text.lines {
        let _ = write!(
            out,
            r#"<tspan x="{}" y="{}">{}</tspan>"#,
            x,
            num(b.top + line.baseline),
            escape(&line.text)
        );
    }
    out.push_str("</text>\n");
}

fn write_bleed(out: &mut String, composition: &Composition) {
    let page = &composition.page.screen;
    let trim = &composition.page.trimbox;
    let inner_left = page.left + trim.left;
    let inner_top = page.top + trim.top;
    let inner_width = (page.width - trim.left - trim.right).max(0.0);
    let inner_height = (page.height - trim.top - trim.bottom).max(0.0);

    // Shade the bleed margin: outer page rect minus the trim rect.
    let _ = writeln!(
        out,
        r#"<path class="bleed" fill="{}" fill-rule="evenodd" pointer-events="none" d="M{} {}h{}v{}h-{}Z M{} {}h{}v{}h-{}Z"/>"#,
        BLEED_COLOR,
        num(page.left),
        num(page.top),
        num(page.width),
        num(page.height),
        num(page.width),
        num(inner_left),
        num(inner_top),
        num(inner_width),
        num(inner_height),
        num(inner_width)
    );
    let _ = writeln!(
        out,
        r#"<rect class="trim" x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-dasharray="4 4" pointer-events="none"/>"#,
        num(inner_left),
        num(inner_top),
        num(inner_width),
        num(inner_height),
        MISSING_COLOR
    );
}

/// Format a coordinate with at most two decimals and no trailing zeros.
fn num(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetStatus;
    use crate::compositor::{Compositor, Viewport};
    use crate::config::EditorConfig;
    use crate::template::{Project, Side};
    use serde_json::json;

    fn composition() -> Composition {
        let project = Project::from_value(json!({
            "name": "svg",
            "pages": { "page_0": {
                "width": 100, "height": 50, "objectsIds": ["pic", "txt"],
                "boxes": { "trimbox": { "top": 5, "right": 5, "bottom": 5, "left": 5 } }
            } },
            "objects": {
                "pic": { "type": "image", "width": 40, "height": 40, "linkedFileName": "a&b.png" },
                "txt": { "type": "text", "left": 50, "width": 50, "height": 20, "isLocked": true,
                         "content": "Tom & <Jerry>\nline 2", "fontFamily": "Serif" }
            }
        }))
        .unwrap();
        Compositor::new(&EditorConfig::default())
            .unwrap()
            .compose(&project, Side::Front, "7", Viewport::scaled(1.0))
            .unwrap()
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(num(120.0), "120");
        assert_eq!(num(12.5), "12.5");
        assert_eq!(num(1.0 / 3.0), "0.33");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn text_is_escaped_and_split_into_lines() {
        let report = AssetReport::default();
        let svg = render_svg(
            &composition(),
            &SvgOptions { show_bleed: false, selected: None, assets: &report },
        );
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;</tspan>"));
        assert!(svg.contains(">line 2</tspan>"));
        assert!(svg.contains(r#"data-id="txt""#));
        assert!(!svg.contains("class=\"bleed\""));
        assert!(!svg.contains("class=\"selection\""));
    }

    #[test]
    fn missing_image_becomes_placeholder() {
        let c = composition();
        let src = c.image_sources().next().unwrap().to_string();
        let mut report = AssetReport::default();
        report.insert(src.clone(), AssetStatus::Missing { reason: "HTTP 404".into() });
        let svg = render_svg(&c, &SvgOptions { show_bleed: false, selected: None, assets: &report });
        assert!(svg.contains("class=\"missing-asset\""));
        assert!(svg.contains("missing: a&amp;b.png"));
        assert!(!svg.contains("<image "));
    }

    #[test]
    fn loaded_image_is_referenced() {
        let report = AssetReport::default();
        let svg = render_svg(&composition(), &SvgOptions { show_bleed: false, selected: None, assets: &report });
        assert!(svg.contains("<image href=\""));
        assert!(svg.contains("preserveAspectRatio=\"xMidYMid slice\""));
    }

    #[test]
    fn bleed_and_selection_overlays() {
        let report = AssetReport::default();
        let svg = render_svg(
            &composition(),
            &SvgOptions { show_bleed: true, selected: Some("txt"), assets: &report },
        );
        assert!(svg.contains("class=\"bleed\""));
        assert!(svg.contains(r#"<rect class="trim" x="5" y="5" width="90" height="40""#));
        assert!(svg.contains("class=\"selection\""));
        assert!(svg.contains("class=\"lock-badge\""));
    }
}
