use super::*;
use crate::placement::PlacementNode;

/// Positions come from the container's placement provider; the block is
/// the bounding box of the placed children.
pub(super) fn plan(
    container: ContainerRef<'_>,
    children: &[ChildBox],
    kind: PlacementKind,
    ctx: &mut LayoutContext<'_>,
) -> Plan {
    let nodes: Vec<PlacementNode> = children
        .iter()
        .map(|child| PlacementNode {
            id: child.id,
            size: child.size,
        })
        .collect();
    let positions = ctx.delegated_positions(container.id, kind, &nodes);
    let rects: Vec<(NodeId, Rect)> = children
        .iter()
        .map(|child| {
            let center = positions.get(&child.id).copied().unwrap_or(child.position);
            (child.id, Rect::from_center(center, child.size))
        })
        .collect();
    let Some(bounds) = Rect::bounding(rects.iter().map(|(_, rect)| *rect)) else {
        return Plan::default();
    };
    let slots = rects
        .into_iter()
        .map(|(id, rect)| Slot {
            id,
            offset: rect.origin() - bounds.origin(),
            size: rect.size(),
        })
        .collect();
    Plan {
        slots,
        size: bounds.size(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{child, container};
    use super::*;
    use crate::config::LayoutConfig;
    use crate::placement::{PlacementLink, PlacementProvider, Providers};

    struct Fixed(BTreeMap<NodeId, Point>);

    impl PlacementProvider for Fixed {
        fn compute_positions(
            &mut self,
            _nodes: &[PlacementNode],
            _links: &[PlacementLink],
        ) -> BTreeMap<NodeId, Point> {
            self.0.clone()
        }
    }

    #[test]
    fn required_size_is_bounding_box() {
        let config = LayoutConfig::default();
        let mut providers = Providers::from_config(&config);
        let mut fixed = BTreeMap::new();
        fixed.insert(NodeId::from_index(1), Point::new(-50.0, 0.0));
        fixed.insert(NodeId::from_index(2), Point::new(50.0, 40.0));
        providers.set(PlacementKind::Force, Box::new(Fixed(fixed)));
        let links = BTreeMap::new();
        let mut ctx = LayoutContext::new(&config, &mut providers, &links);

        let mut orphan = child(3, 10.0, 10.0);
        orphan.position = Point::new(0.0, -100.0);
        let children = vec![child(1, 20.0, 20.0), child(2, 40.0, 20.0), orphan];
        let plan = plan(container(), &children, PlacementKind::Force, &mut ctx);
        // x: -60..70, y: -105..50
        assert_eq!(plan.size, Size::new(130.0, 155.0));
        assert_eq!(plan.slots[0].offset, Point::new(0.0, 95.0));
        assert_eq!(plan.slots[1].offset, Point::new(90.0, 135.0));
        assert_eq!(plan.slots[2].offset, Point::new(55.0, 0.0));
    }

    #[test]
    fn provider_runs_once_per_pass() {
        let config = LayoutConfig::default();
        let mut providers = Providers::from_config(&config);
        let links = BTreeMap::new();
        let mut ctx = LayoutContext::new(&config, &mut providers, &links);
        let children = vec![child(1, 20.0, 20.0), child(2, 20.0, 20.0)];
        let kind = ArrangementKind::Delegated(PlacementKind::Layered);
        let first = kind.plan(container(), &children, &mut ctx);
        let second = kind.plan(container(), &children, &mut ctx);
        assert_eq!(first, second);
        assert_eq!(ctx.provider_calls(), 1);
    }

    #[test]
    fn layered_links_become_left_to_right_slots() {
        let config = LayoutConfig::default();
        let mut providers = Providers::from_config(&config);
        let mut links = BTreeMap::new();
        links.insert(
            NodeId::from_index(0),
            vec![PlacementLink {
                source: NodeId::from_index(1),
                target: NodeId::from_index(2),
            }],
        );
        let mut ctx = LayoutContext::new(&config, &mut providers, &links);
        let children = vec![child(1, 60.0, 20.0), child(2, 60.0, 20.0)];
        let plan = plan(container(), &children, PlacementKind::Layered, &mut ctx);
        let (source, target) = (plan.slots[0], plan.slots[1]);
        assert_eq!(source.offset.x, 0.0);
        assert!(target.offset.x >= source.offset.x + 60.0 + config.layered.rank_gap - 0.01);
        assert!((plan.size.width - (target.offset.x + 60.0)).abs() < 0.01);
    }
}
