use super::*;
use super::foundation::paired;

/// Load and report slots, placed like a Foundation's raw and base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MartParams {
    pub orientation: Orientation,
}

pub(super) fn plan(
    container: ContainerRef<'_>,
    children: &[ChildBox],
    params: &MartParams,
    ctx: &mut LayoutContext<'_>,
) -> Plan {
    paired(
        container,
        children,
        (SlotRole::Load, SlotRole::Report),
        params.orientation,
        ctx,
    )
}

/// A category naming the role wins outright; otherwise the label decides,
/// `load` before `report` (or its `rprt` abbreviation).
pub fn infer_mart_role(category: Option<&str>, label: &str) -> Option<SlotRole> {
    let by_category = category.and_then(|category| {
        match category.trim().to_ascii_lowercase().as_str() {
            "load" => Some(SlotRole::Load),
            "report" => Some(SlotRole::Report),
            _ => None,
        }
    });
    by_category.or_else(|| {
        let lower = label.to_ascii_lowercase();
        if lower.contains("load") {
            Some(SlotRole::Load)
        } else if lower.contains("report") || lower.contains("rprt") {
            Some(SlotRole::Report)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::super::tests::{child, container};
    use super::*;
    use crate::config::LayoutConfig;
    use crate::placement::Providers;
    use rstest::rstest;

    fn run(orientation: Orientation, children: &[ChildBox]) -> (Plan, usize) {
        let config = LayoutConfig::default();
        let mut providers = Providers::from_config(&config);
        let links = BTreeMap::new();
        let mut ctx = LayoutContext::new(&config, &mut providers, &links);
        let plan = plan(container(), children, &MartParams { orientation }, &mut ctx);
        let warnings = ctx.take_warnings().len();
        (plan, warnings)
    }

    fn slots() -> Vec<ChildBox> {
        vec![
            child(1, 120.0, 44.0).with_role(SlotRole::Report),
            child(2, 120.0, 44.0).with_role(SlotRole::Load),
        ]
    }

    #[test]
    fn horizontal_places_load_left_of_report() {
        let (plan, warnings) = run(Orientation::Horizontal, &slots());
        assert_eq!(warnings, 0);
        assert_eq!(plan.slots[0].id, NodeId::from_index(2));
        assert_eq!(plan.slots[1].offset, Point::new(140.0, 0.0));
        assert_eq!(plan.size, Size::new(260.0, 44.0));
    }

    #[rstest]
    #[case(Orientation::Vertical, 2)]
    #[case(Orientation::Rotate90, 2)]
    #[case(Orientation::Rotate270, 1)]
    fn vertical_orientations_stack(#[case] orientation: Orientation, #[case] top: usize) {
        let (plan, _) = run(orientation, &slots());
        assert_eq!(plan.slots[0].id, NodeId::from_index(top));
        assert_eq!(plan.slots[1].offset.y, 54.0);
        assert_eq!(plan.size, Size::new(120.0, 98.0));
    }

    #[test]
    fn missing_report_is_recovered() {
        let (plan, warnings) = run(Orientation::Horizontal, &slots()[1..]);
        assert_eq!(warnings, 1);
        assert_eq!(plan.size, Size::new(120.0, 44.0));
    }

    #[rstest]
    #[case(Some("report"), "daily load", Some(SlotRole::Report))]
    #[case(None, "Load orders", Some(SlotRole::Load))]
    #[case(None, "orders_rprt", Some(SlotRole::Report))]
    #[case(Some("other"), "Monthly report", Some(SlotRole::Report))]
    #[case(None, "orders", None)]
    fn infers_load_and_report(
        #[case] category: Option<&str>,
        #[case] label: &str,
        #[case] expected: Option<SlotRole>,
    ) {
        assert_eq!(infer_mart_role(category, label), expected);
    }
}
