//! Waypoint routing for sequence flow edges.

use std::cmp::Ordering;

use flowbpmn_core::geometry::{Bounds, Point};

use crate::config::ExportConfig;

/// Fixed connection point on a gateway diamond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Port {
    Bottom,
    Left,
    Right,
}

impl Port {
    fn point(self, bounds: Bounds) -> Point {
        let center = bounds.center();
        match self {
            Self::Bottom => Point::new(center.x(), bounds.max_y()),
            Self::Left => Point::new(bounds.min_x(), center.y()),
            Self::Right => Point::new(bounds.max_x(), center.y()),
        }
    }
}

/// What port assignment looks at for one outgoing gateway flow.
#[derive(Debug, Clone, Copy)]
pub(super) struct PortKey<'a> {
    pub label: Option<&'a str>,
    pub target: &'a str,
}

/// Rank used when every branch is labeled: "no" goes left, "yes" right.
fn branch_rank(label: &str) -> u8 {
    match label.to_lowercase().as_str() {
        "no" => 0,
        "yes" => 2,
        _ => 1,
    }
}

fn compare_keys(a: &PortKey, b: &PortKey, all_labeled: bool) -> Ordering {
    if all_labeled {
        let (a_label, b_label) = (a.label.unwrap_or_default(), b.label.unwrap_or_default());
        branch_rank(a_label)
            .cmp(&branch_rank(b_label))
            .then_with(|| a_label.cmp(b_label))
            .then_with(|| a.target.cmp(b.target))
    } else {
        a.target.cmp(b.target)
    }
}

/// Assign ports to the outgoing flows of one gateway.
///
/// The returned vector is parallel to `outgoing`. Gateways with more than
/// three outgoing flows get no fixed ports and fall back to boundary routing.
pub(super) fn gateway_ports(outgoing: &[PortKey]) -> Vec<Option<Port>> {
    let slots: &[Port] = match outgoing.len() {
        1 => &[Port::Bottom],
        2 => &[Port::Left, Port::Right],
        3 => &[Port::Bottom, Port::Left, Port::Right],
        n => return vec![None; n],
    };

    let all_labeled = outgoing.iter().all(|key| key.label.is_some());
    let mut order: Vec<usize> = (0..outgoing.len()).collect();
    order.sort_by(|&a, &b| compare_keys(&outgoing[a], &outgoing[b], all_labeled));

    let mut ports = vec![None; outgoing.len()];
    for (slot, index) in order.into_iter().enumerate() {
        ports[index] = Some(slots[slot]);
    }
    ports
}

/// Point where the ray from the center of `bounds` toward `toward` leaves
/// the box, rounded to whole units.
pub(super) fn boundary_point(bounds: Bounds, toward: Point) -> Point {
    let center = bounds.center();
    let delta = toward.sub_point(center);
    let (dx, dy) = (delta.x(), delta.y());
    if dx == 0.0 && dy == 0.0 {
        return center.round();
    }

    let half_width = bounds.width() / 2.0;
    let half_height = bounds.height() / 2.0;

    let exit = if dx.abs() / half_width > dy.abs() / half_height {
        let x = if dx > 0.0 { bounds.max_x() } else { bounds.min_x() };
        Point::new(x, center.y() + dy * half_width / dx.abs())
    } else {
        let y = if dy > 0.0 { bounds.max_y() } else { bounds.min_y() };
        Point::new(center.x() + dx * half_height / dy.abs(), y)
    };

    bounds.clamp(exit).round()
}

/// Waypoints for a flow from `source` to `target`.
///
/// Targets lying more than the loop-back threshold to the left of their
/// source get a four point detour below both endpoints.
pub(super) fn waypoints(
    source: Bounds,
    target: Bounds,
    port: Option<Port>,
    config: &ExportConfig,
) -> Vec<Point> {
    let start = match port {
        Some(port) => port.point(source).round(),
        None => boundary_point(source, target.center()),
    };
    let end = boundary_point(target, source.center());

    if target.center().x() < source.center().x() - config.loop_back_threshold() {
        let detour_y = start.y().max(end.y()) + config.loop_back_drop();
        let inset = config.loop_back_inset();
        return vec![
            start,
            Point::new(start.x() + inset, detour_y),
            Point::new(end.x() - inset, detour_y),
            end,
        ];
    }

    vec![start, end]
}
