use crate::render::{
    tooltip::{Tooltip, TooltipKind},
    unit::Color3,
    Layer, Marker, PathLayer, RenderFrame, Subpath,
};
use std::fmt::Write;
use strum::IntoEnumIterator;
use svg::{
    node::{
        self,
        element::{Circle, Group, Path, Rectangle, Text},
        Comment,
    },
    Document,
};

const TOOLTIP_BACKGROUND: Color3 = Color3::new_int(0, 0, 0);
const TOOLTIP_TEXT: Color3 = Color3::new_int(255, 255, 255);
const TOOLTIP_SECONDARY_TEXT: Color3 = Color3::new_int(156, 163, 175);

/// Convert a rendered frame to an SVG document, sized to the container. Each
/// layer becomes a group, in bottom-to-top order.
pub fn frame_to_svg(frame: &RenderFrame) -> Document {
    let mut document = Document::new()
        .set("width", frame.size.width)
        .set("height", frame.size.height)
        .set("viewBox", (0.0, 0.0, frame.size.width, frame.size.height))
        .add(Comment::new(format!(" {:?} map, {} ", frame.kind, frame.size)));

    for layer in Layer::iter() {
        let group = Group::new().set("id", layer.to_string());
        let group = match layer {
            Layer::Background => draw_background(frame, group),
            Layer::Boundaries => {
                let group = draw_paths(&frame.boundaries, group);
                draw_paths(&frame.borders, group)
            }
            Layer::Grid => draw_paths(&frame.grid, group),
            Layer::Markers => frame
                .markers
                .iter()
                .fold(group, |group, marker| group.add(draw_marker(marker))),
            Layer::Tooltips => frame
                .tooltips
                .iter()
                .fold(group, |group, tooltip| group.add(draw_tooltip(tooltip))),
        };
        document = document.add(group);
    }

    document
}

fn draw_background(frame: &RenderFrame, group: Group) -> Group {
    let group = group.add(
        Rectangle::new()
            .set("width", frame.size.width)
            .set("height", frame.size.height)
            .set("fill", frame.background.to_html()),
    );
    match frame.shell {
        Some(shell) => group.add(
            Circle::new()
                .set("cx", shell.center.x)
                .set("cy", shell.center.y)
                .set("r", shell.radius)
                .set("fill", shell.fill.to_html())
                .set("stroke", shell.stroke.to_html())
                .set("stroke-width", 1),
        ),
        None => group,
    }
}

/// Build the `d` attribute for a set of subpaths
fn path_data(subpaths: &[Subpath]) -> String {
    let mut data = String::new();
    for subpath in subpaths {
        for (i, point) in subpath.points.iter().enumerate() {
            let command = if i == 0 { 'M' } else { 'L' };
            // Writing to a String can't fail
            let _ = write!(data, "{}{:.2},{:.2}", command, point.x, point.y);
        }
        if subpath.closed {
            data.push('Z');
        }
    }
    data
}

fn draw_paths(layer: &PathLayer, group: Group) -> Group {
    let style = &layer.style;
    let mut group = group
        .set(
            "fill",
            style.fill.map_or_else(|| "none".to_owned(), Color3::to_html),
        )
        .set("fill-rule", "evenodd")
        .set("stroke", style.stroke.to_html())
        .set("stroke-width", style.stroke_width)
        .set("opacity", style.opacity);
    if style.dashed {
        group = group.set("stroke-dasharray", "2,2");
    }
    layer.paths.iter().fold(group, |group, path| {
        group.add(Path::new().set("d", path_data(&path.subpaths)))
    })
}

fn draw_marker(marker: &Marker) -> Circle {
    Circle::new()
        .set("cx", marker.position.x)
        .set("cy", marker.position.y)
        .set("r", marker.radius)
        .set("fill", marker.fill.to_html())
        .set("stroke", marker.stroke.to_html())
        .set("stroke-width", 1)
        .set("data-station", marker.station.as_str())
}

fn draw_tooltip(tooltip: &Tooltip) -> Group {
    let rect = tooltip.rect;
    let class = match tooltip.kind {
        TooltipKind::Hover => "tooltip hover",
        TooltipKind::Pinned => "tooltip pinned",
    };
    let group = Group::new().set("class", class).add(
        Rectangle::new()
            .set("x", rect.x)
            .set("y", rect.y)
            .set("width", rect.width)
            .set("height", rect.height)
            .set("rx", 8)
            .set("fill", TOOLTIP_BACKGROUND.to_html())
            .set("fill-opacity", 0.7),
    );

    tooltip
        .lines
        .iter()
        .enumerate()
        .fold(group, |group, (i, line)| {
            // The last line is secondary info
            let color = if i > 0 && i + 1 == tooltip.lines.len() {
                TOOLTIP_SECONDARY_TEXT
            } else {
                TOOLTIP_TEXT
            };
            let y = tooltip.text_origin.y + i as f64 * tooltip.line_height;
            group.add(
                Text::new()
                    .set("x", tooltip.text_origin.x)
                    .set("y", y)
                    .set("font-size", tooltip.font_size)
                    .set("fill", color.to_html())
                    .add(node::Text::new(line.as_str())),
            )
        })
}
