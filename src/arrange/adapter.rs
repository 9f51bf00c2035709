use super::*;

/// Which slots an adapter shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterMode {
    Full,
    ArchiveOnly,
    StagingArchive,
    StagingTransform,
}

impl AdapterMode {
    pub fn parse(value: &str) -> Option<AdapterMode> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "full" => Some(AdapterMode::Full),
            "archive_only" | "archiveonly" => Some(AdapterMode::ArchiveOnly),
            "staging_archive" | "stagingarchive" => Some(AdapterMode::StagingArchive),
            "staging_transform" | "stagingtransform" => Some(AdapterMode::StagingTransform),
            _ => None,
        }
    }

    pub fn required_roles(self) -> &'static [SlotRole] {
        match self {
            AdapterMode::Full => &[SlotRole::Staging, SlotRole::Archive, SlotRole::Transform],
            AdapterMode::ArchiveOnly => &[SlotRole::Archive],
            AdapterMode::StagingArchive => &[SlotRole::Staging, SlotRole::Archive],
            AdapterMode::StagingTransform => &[SlotRole::Staging, SlotRole::Transform],
        }
    }

    /// Internal edges an adapter draws between its own slots.
    pub fn internal_links(self) -> &'static [(SlotRole, SlotRole)] {
        match self {
            AdapterMode::Full => &[
                (SlotRole::Staging, SlotRole::Transform),
                (SlotRole::Staging, SlotRole::Archive),
            ],
            AdapterMode::StagingArchive => &[(SlotRole::Staging, SlotRole::Archive)],
            AdapterMode::StagingTransform => &[(SlotRole::Staging, SlotRole::Transform)],
            AdapterMode::ArchiveOnly => &[],
        }
    }
}

/// The five numbered adapter sub-arrangements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdapterArrangement {
    /// 1: staging and archive side by side, transform below spanning under
    /// archive. Transform width derives from both siblings.
    TransformBelow,
    /// 2: archive above staging, transform right of staging.
    ArchiveAbove,
    /// 3: archive over transform in the right column, staging spans both.
    StagingSpan,
    /// 4: present slots in one row.
    Line,
    /// 5: present slots in one column.
    Stack,
}

impl AdapterArrangement {
    pub fn from_number(value: u8) -> Option<AdapterArrangement> {
        match value {
            1 => Some(AdapterArrangement::TransformBelow),
            2 => Some(AdapterArrangement::ArchiveAbove),
            3 => Some(AdapterArrangement::StagingSpan),
            4 => Some(AdapterArrangement::Line),
            5 => Some(AdapterArrangement::Stack),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            AdapterArrangement::TransformBelow => 1,
            AdapterArrangement::ArchiveAbove => 2,
            AdapterArrangement::StagingSpan => 3,
            AdapterArrangement::Line => 4,
            AdapterArrangement::Stack => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterParams {
    pub mode: AdapterMode,
    pub arrangement: AdapterArrangement,
}

impl AdapterParams {
    /// Partial modes pin their arrangement.
    pub fn new(mode: AdapterMode, arrangement: AdapterArrangement) -> Self {
        let arrangement = match mode {
            AdapterMode::Full => arrangement,
            AdapterMode::StagingArchive | AdapterMode::StagingTransform => AdapterArrangement::Line,
            AdapterMode::ArchiveOnly => AdapterArrangement::Stack,
        };
        Self { mode, arrangement }
    }
}

impl Default for AdapterParams {
    fn default() -> Self {
        Self::new(AdapterMode::Full, AdapterArrangement::TransformBelow)
    }
}

#[derive(Default)]
struct Slots<'a> {
    staging: Option<&'a ChildBox>,
    archive: Option<&'a ChildBox>,
    transform: Option<&'a ChildBox>,
    extras: Vec<&'a ChildBox>,
}

impl<'a> Slots<'a> {
    fn collect(children: &'a [ChildBox]) -> Self {
        let mut slots = Slots::default();
        for child in children {
            let target = match child.role {
                Some(SlotRole::Staging) => &mut slots.staging,
                Some(SlotRole::Archive) => &mut slots.archive,
                Some(SlotRole::Transform) => &mut slots.transform,
                _ => {
                    slots.extras.push(child);
                    continue;
                }
            };
            if target.is_none() {
                *target = Some(child);
            } else {
                slots.extras.push(child);
            }
        }
        slots
    }

    fn get(&self, role: SlotRole) -> Option<&'a ChildBox> {
        match role {
            SlotRole::Staging => self.staging,
            SlotRole::Archive => self.archive,
            SlotRole::Transform => self.transform,
            _ => None,
        }
    }
}

pub(super) fn plan(
    container: ContainerRef<'_>,
    children: &[ChildBox],
    params: &AdapterParams,
    ctx: &mut LayoutContext<'_>,
) -> Plan {
    let slots = Slots::collect(children);
    for role in params.mode.required_roles() {
        if slots.get(*role).is_none() {
            ctx.missing_slot(container, *role);
        }
    }
    let spacing = ctx.config.node_spacing;
    let (h, v) = (spacing.horizontal, spacing.vertical);
    let mut placed = match params.arrangement {
        AdapterArrangement::TransformBelow => transform_below(&slots, h, v),
        AdapterArrangement::ArchiveAbove => archive_above(&slots, h, v),
        AdapterArrangement::StagingSpan => staging_span(&slots, h, v),
        AdapterArrangement::Line => line(&slots, h),
        AdapterArrangement::Stack => stack(&slots, v),
    };
    place_extras(&mut placed, &slots.extras, h, v);
    Plan::from_slots(placed)
}

fn at(child: &ChildBox, x: f32, y: f32) -> Slot {
    Slot {
        id: child.id,
        offset: Point::new(x, y),
        size: child.size,
    }
}

fn transform_below(slots: &Slots<'_>, h: f32, v: f32) -> Vec<Slot> {
    let mut out = Vec::new();
    let mut x = 0.0;
    if let Some(staging) = slots.staging {
        out.push(at(staging, 0.0, 0.0));
        x = staging.size.width + h;
    }
    if let Some(archive) = slots.archive {
        out.push(at(archive, x, 0.0));
    }
    let top_height = [slots.staging, slots.archive]
        .iter()
        .flatten()
        .map(|child| child.size.height)
        .fold(0.0f32, f32::max);
    if let Some(transform) = slots.transform {
        let y = if top_height > 0.0 { top_height + v } else { 0.0 };
        match (slots.staging, slots.archive) {
            (Some(staging), Some(archive)) => {
                // Sized from the top row first, then right-aligned with archive.
                let width = archive.size.width + staging.size.width * (5.0 / 16.0) + h;
                let right = staging.size.width + h + archive.size.width;
                out.push(Slot {
                    id: transform.id,
                    offset: Point::new(right - width, y),
                    size: Size::new(width, transform.size.height),
                });
            }
            _ => out.push(at(transform, 0.0, y)),
        }
    }
    out
}

fn archive_above(slots: &Slots<'_>, h: f32, v: f32) -> Vec<Slot> {
    let mut out = Vec::new();
    let mut row_y = 0.0;
    if let Some(archive) = slots.archive {
        out.push(at(archive, 0.0, 0.0));
        row_y = archive.size.height + v;
    }
    let mut x = 0.0;
    if let Some(staging) = slots.staging {
        out.push(at(staging, 0.0, row_y));
        x = staging.size.width + h;
    }
    if let Some(transform) = slots.transform {
        out.push(at(transform, x, row_y));
    }
    out
}

fn staging_span(slots: &Slots<'_>, h: f32, v: f32) -> Vec<Slot> {
    let mut out = Vec::new();
    let mut column_x = 0.0;
    if let Some(staging) = slots.staging {
        let height = match (slots.archive, slots.transform) {
            (Some(archive), Some(transform)) => {
                archive.size.height + v + transform.size.height
            }
            _ => staging.size.height,
        };
        out.push(Slot {
            id: staging.id,
            offset: Point::ORIGIN,
            size: Size::new(staging.size.width, height),
        });
        column_x = staging.size.width + h;
    }
    let mut y = 0.0;
    if let Some(archive) = slots.archive {
        out.push(at(archive, column_x, 0.0));
        y = archive.size.height + v;
    }
    if let Some(transform) = slots.transform {
        out.push(at(transform, column_x, y));
    }
    out
}

fn line(slots: &Slots<'_>, h: f32) -> Vec<Slot> {
    let present: Vec<&ChildBox> = [slots.staging, slots.archive, slots.transform]
        .into_iter()
        .flatten()
        .collect();
    let row_height = present
        .iter()
        .map(|child| child.size.height)
        .fold(0.0f32, f32::max);
    let mut x = 0.0;
    let mut out = Vec::new();
    for child in present {
        out.push(at(child, x, (row_height - child.size.height) / 2.0));
        x += child.size.width + h;
    }
    out
}

fn stack(slots: &Slots<'_>, v: f32) -> Vec<Slot> {
    let present: Vec<&ChildBox> = [slots.archive, slots.staging, slots.transform]
        .into_iter()
        .flatten()
        .collect();
    let column_width = present
        .iter()
        .map(|child| child.size.width)
        .fold(0.0f32, f32::max);
    let mut y = 0.0;
    let mut out = Vec::new();
    for child in present {
        out.push(at(child, (column_width - child.size.width) / 2.0, y));
        y += child.size.height + v;
    }
    out
}

/// Role from a child's category or label, the way adapter data is usually
/// tagged (`stg_orders`, `Archive orders`, ...).
pub fn infer_adapter_role(category: Option<&str>, label: &str) -> Option<SlotRole> {
    let classify = |text: &str| {
        let lower = text.to_ascii_lowercase();
        if lower.contains("staging") || lower.contains("stg") {
            Some(SlotRole::Staging)
        } else if lower.contains("archive") || lower.contains("arc") {
            Some(SlotRole::Archive)
        } else if ["transform", "trf", "trn", "tfm"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            Some(SlotRole::Transform)
        } else {
            None
        }
    };
    category.and_then(classify).or_else(|| classify(label))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{child, container};
    use super::*;
    use crate::config::LayoutConfig;
    use crate::placement::Providers;
    use rstest::rstest;

    fn run(children: &[ChildBox], params: AdapterParams) -> (Plan, usize) {
        let config = LayoutConfig::default();
        let mut providers = Providers::from_config(&config);
        let links = BTreeMap::new();
        let mut ctx = LayoutContext::new(&config, &mut providers, &links);
        let plan = plan(container(), children, &params, &mut ctx);
        let warnings = ctx.take_warnings().len();
        (plan, warnings)
    }

    fn full_slots() -> Vec<ChildBox> {
        vec![
            child(1, 100.0, 44.0).with_role(SlotRole::Staging),
            child(2, 120.0, 44.0).with_role(SlotRole::Archive),
            child(3, 150.0, 44.0).with_role(SlotRole::Transform),
        ]
    }

    fn slot(plan: &Plan, index: usize) -> Slot {
        *plan
            .slots
            .iter()
            .find(|slot| slot.id == NodeId::from_index(index))
            .unwrap()
    }

    #[test]
    fn transform_width_derives_from_siblings() {
        let (plan, warnings) = run(&full_slots(), AdapterParams::default());
        assert_eq!(warnings, 0);
        let transform = slot(&plan, 3);
        assert_eq!(transform.size.width, 120.0 + 100.0 * 5.0 / 16.0 + 20.0);
        assert_eq!(transform.size.width, 171.25);
        assert_eq!(transform.offset, Point::new(68.75, 54.0));
        assert_eq!(plan.size, Size::new(240.0, 98.0));
    }

    #[test]
    fn archive_above_stacks_left_column() {
        let params = AdapterParams::new(AdapterMode::Full, AdapterArrangement::ArchiveAbove);
        let (plan, _) = run(&full_slots(), params);
        assert_eq!(slot(&plan, 2).offset, Point::new(0.0, 0.0));
        assert_eq!(slot(&plan, 1).offset, Point::new(0.0, 54.0));
        assert_eq!(slot(&plan, 3).offset, Point::new(120.0, 54.0));
        assert_eq!(plan.size, Size::new(270.0, 98.0));
    }

    #[test]
    fn staging_spans_right_column() {
        let params = AdapterParams::new(AdapterMode::Full, AdapterArrangement::StagingSpan);
        let (plan, _) = run(&full_slots(), params);
        let staging = slot(&plan, 1);
        assert_eq!(staging.size.height, 98.0);
        assert_eq!(slot(&plan, 2).offset, Point::new(120.0, 0.0));
        assert_eq!(slot(&plan, 3).offset, Point::new(120.0, 54.0));
    }

    #[test]
    fn partial_modes_pin_arrangement() {
        let params = AdapterParams::new(AdapterMode::StagingArchive, AdapterArrangement::StagingSpan);
        assert_eq!(params.arrangement, AdapterArrangement::Line);
        let params = AdapterParams::new(AdapterMode::ArchiveOnly, AdapterArrangement::TransformBelow);
        assert_eq!(params.arrangement, AdapterArrangement::Stack);
    }

    #[test]
    fn archive_only_skips_absent_siblings() {
        let children = vec![child(2, 120.0, 44.0).with_role(SlotRole::Archive)];
        let params = AdapterParams::new(AdapterMode::ArchiveOnly, AdapterArrangement::Stack);
        let (plan, warnings) = run(&children, params);
        assert_eq!(warnings, 0);
        assert_eq!(plan.size, Size::new(120.0, 44.0));
    }

    #[test]
    fn missing_required_slot_degrades() {
        let children = vec![
            child(1, 100.0, 44.0).with_role(SlotRole::Staging),
            child(3, 150.0, 44.0).with_role(SlotRole::Transform),
        ];
        let (plan, warnings) = run(&children, AdapterParams::default());
        assert_eq!(warnings, 1);
        // Transform keeps its own width without the archive sibling.
        assert_eq!(slot(&plan, 3).size.width, 150.0);
        assert_eq!(slot(&plan, 3).offset, Point::new(0.0, 54.0));
    }

    #[test]
    fn unroled_children_go_under_the_slots() {
        let mut children = full_slots();
        children.push(child(4, 30.0, 30.0));
        let (plan, _) = run(&children, AdapterParams::default());
        assert_eq!(slot(&plan, 4).offset, Point::new(0.0, 108.0));
    }

    #[rstest]
    #[case(Some("stg"), "whatever", Some(SlotRole::Staging))]
    #[case(None, "Archive orders", Some(SlotRole::Archive))]
    #[case(None, "orders_tfm", Some(SlotRole::Transform))]
    #[case(Some("other"), "orders", None)]
    fn infers_roles(
        #[case] category: Option<&str>,
        #[case] label: &str,
        #[case] expected: Option<SlotRole>,
    ) {
        assert_eq!(infer_adapter_role(category, label), expected);
    }

    #[rstest]
    #[case("full", Some(AdapterMode::Full))]
    #[case("archive-only", Some(AdapterMode::ArchiveOnly))]
    #[case("staging_transform", Some(AdapterMode::StagingTransform))]
    #[case("sideways", None)]
    fn parses_modes(#[case] raw: &str, #[case] expected: Option<AdapterMode>) {
        assert_eq!(AdapterMode::parse(raw), expected);
    }
}
