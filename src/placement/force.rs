use std::collections::{BTreeMap, HashMap};
use std::f32::consts::TAU;

use crate::config::ForceConfig;
use crate::diagram::NodeId;
use crate::geometry::Point;

use super::{PlacementLink, PlacementNode, PlacementProvider};

/// Capped-iteration force simulation: link springs, many-body charge,
/// rectangle collision and a centering pull.
///
/// Seeds are laid on a circle in input order, so the same children and links
/// always settle in the same place.
#[derive(Debug, Clone)]
pub struct ForcePlacement {
    config: ForceConfig,
}

/// Collision-only sweeps after the main loop so no two boxes overlap.
const SETTLE_PASSES: usize = 20;
const VELOCITY_DECAY: f32 = 0.4;
const MIN_DISTANCE: f32 = 1.0;

impl ForcePlacement {
    pub fn new(config: ForceConfig) -> Self {
        Self { config }
    }
}

impl PlacementProvider for ForcePlacement {
    fn compute_positions(
        &mut self,
        nodes: &[PlacementNode],
        links: &[PlacementLink],
    ) -> BTreeMap<NodeId, Point> {
        let count = nodes.len();
        if count == 0 {
            return BTreeMap::new();
        }
        let index: HashMap<NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(idx, node)| (node.id, idx))
            .collect();
        let springs: Vec<(usize, usize)> = links
            .iter()
            .filter_map(|link| Some((*index.get(&link.source)?, *index.get(&link.target)?)))
            .filter(|(a, b)| a != b)
            .collect();

        let circumference: f32 = nodes
            .iter()
            .map(|node| node.size.width.max(node.size.height) + self.config.collide_padding)
            .sum();
        let radius = if count == 1 {
            0.0
        } else {
            (circumference / TAU).max(self.config.link_distance / 2.0)
        };
        let mut pos: Vec<Point> = (0..count)
            .map(|idx| {
                let angle = TAU * idx as f32 / count as f32;
                Point::new(radius * angle.cos(), radius * angle.sin())
            })
            .collect();
        let mut vel = vec![Point::ORIGIN; count];

        let iterations = self.config.iterations.max(1);
        let alpha_min = 0.001f32;
        let alpha_decay = 1.0 - alpha_min.powf(1.0 / iterations as f32);
        let mut alpha = 1.0f32;

        for _ in 0..iterations {
            for &(a, b) in &springs {
                let (dx, dy, dist) = separation(pos[b], pos[a], a, b);
                let pull = (dist - self.config.link_distance) / dist
                    * self.config.link_strength
                    * alpha
                    / 2.0;
                vel[a].x += dx * pull;
                vel[a].y += dy * pull;
                vel[b].x -= dx * pull;
                vel[b].y -= dy * pull;
            }
            if self.config.charge != 0.0 {
                for i in 0..count {
                    for j in (i + 1)..count {
                        let (dx, dy, dist) = separation(pos[i], pos[j], i, j);
                        let push = -self.config.charge * alpha / (dist * dist);
                        vel[i].x += dx / dist * push;
                        vel[i].y += dy / dist * push;
                        vel[j].x -= dx / dist * push;
                        vel[j].y -= dy / dist * push;
                    }
                }
            }
            for i in 0..count {
                vel[i].x -= pos[i].x * self.config.center_strength * alpha;
                vel[i].y -= pos[i].y * self.config.center_strength * alpha;
                vel[i].x *= 1.0 - VELOCITY_DECAY;
                vel[i].y *= 1.0 - VELOCITY_DECAY;
                pos[i] += vel[i];
            }
            collide(&mut pos, nodes, self.config.collide_padding);
            alpha -= alpha * alpha_decay;
        }
        for _ in 0..SETTLE_PASSES {
            if !collide(&mut pos, nodes, self.config.collide_padding) {
                break;
            }
        }

        nodes
            .iter()
            .zip(pos)
            .map(|(node, point)| (node.id, point))
            .collect()
    }
}

/// Vector from `b` to `a` and its length, jittered apart when the two points
/// coincide.
fn separation(a: Point, b: Point, ia: usize, ib: usize) -> (f32, f32, f32) {
    let mut dx = a.x - b.x;
    let mut dy = a.y - b.y;
    if dx.abs() < f32::EPSILON && dy.abs() < f32::EPSILON {
        dx = (ia as f32 - ib as f32) * 1e-3;
        dy = 1e-3;
    }
    let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
    (dx, dy, dist)
}

/// Push overlapping boxes apart along the axis of least overlap. Returns
/// whether anything moved.
fn collide(pos: &mut [Point], nodes: &[PlacementNode], padding: f32) -> bool {
    let mut moved = false;
    for i in 0..pos.len() {
        for j in (i + 1)..pos.len() {
            let (dx, dy, _) = separation(pos[i], pos[j], i, j);
            let overlap_x =
                (nodes[i].size.width + nodes[j].size.width) / 2.0 + padding - dx.abs();
            let overlap_y =
                (nodes[i].size.height + nodes[j].size.height) / 2.0 + padding - dy.abs();
            if overlap_x <= 0.0 || overlap_y <= 0.0 {
                continue;
            }
            moved = true;
            if overlap_x < overlap_y {
                let shift = overlap_x / 2.0 * dx.signum();
                pos[i].x += shift;
                pos[j].x -= shift;
            } else {
                let shift = overlap_y / 2.0 * dy.signum();
                pos[i].y += shift;
                pos[j].y -= shift;
            }
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Rect, Size};

    fn nodes(count: usize) -> Vec<PlacementNode> {
        (0..count)
            .map(|idx| PlacementNode {
                id: NodeId::from_index(idx + 1),
                size: Size::new(60.0, 30.0),
            })
            .collect()
    }

    #[test]
    fn single_node_sits_at_origin() {
        let mut sim = ForcePlacement::new(ForceConfig::default());
        let out = sim.compute_positions(&nodes(1), &[]);
        assert!(out[&NodeId::from_index(1)].approx_eq(Point::ORIGIN));
    }

    #[test]
    fn settled_boxes_do_not_overlap() {
        let input = nodes(6);
        let links = vec![
            PlacementLink {
                source: input[0].id,
                target: input[1].id,
            },
            PlacementLink {
                source: input[1].id,
                target: input[2].id,
            },
        ];
        let mut sim = ForcePlacement::new(ForceConfig::default());
        let out = sim.compute_positions(&input, &links);
        let rects: Vec<Rect> = input
            .iter()
            .map(|node| Rect::from_center(out[&node.id], node.size))
            .collect();
        for (i, a) in rects.iter().enumerate() {
            for b in rects.iter().skip(i + 1) {
                let overlaps = a.x < b.right() - 0.5
                    && b.x < a.right() - 0.5
                    && a.y < b.bottom() - 0.5
                    && b.y < a.bottom() - 0.5;
                assert!(!overlaps, "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn same_input_same_output() {
        let input = nodes(4);
        let mut sim = ForcePlacement::new(ForceConfig::default());
        let first = sim.compute_positions(&input, &[]);
        let second = sim.compute_positions(&input, &[]);
        assert_eq!(first, second);
    }
}
