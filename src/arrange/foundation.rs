use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Horizontal,
    HorizontalLine,
    Vertical,
    Rotate90,
    Rotate270,
}

impl Orientation {
    pub fn parse(value: &str) -> Option<Orientation> {
        match value.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Some(Orientation::Horizontal),
            "horizontal_line" | "horizontal-line" => Some(Orientation::HorizontalLine),
            "vertical" => Some(Orientation::Vertical),
            "rotate90" => Some(Orientation::Rotate90),
            "rotate270" => Some(Orientation::Rotate270),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FoundationParams {
    pub orientation: Orientation,
}

pub(super) fn plan(
    container: ContainerRef<'_>,
    children: &[ChildBox],
    params: &FoundationParams,
    ctx: &mut LayoutContext<'_>,
) -> Plan {
    paired(
        container,
        children,
        (SlotRole::Raw, SlotRole::Base),
        params.orientation,
        ctx,
    )
}

/// Two named slots side by side or stacked, `first` leading unless the
/// orientation is `Rotate270`. Children without either role follow below.
pub(super) fn paired(
    container: ContainerRef<'_>,
    children: &[ChildBox],
    (first_role, second_role): (SlotRole, SlotRole),
    orientation: Orientation,
    ctx: &mut LayoutContext<'_>,
) -> Plan {
    let mut first = None;
    let mut second = None;
    let mut extras = Vec::new();
    for child in children {
        match child.role {
            Some(role) if role == first_role && first.is_none() => first = Some(child),
            Some(role) if role == second_role && second.is_none() => second = Some(child),
            _ => extras.push(child),
        }
    }
    if first.is_none() {
        ctx.missing_slot(container, first_role);
    }
    if second.is_none() {
        ctx.missing_slot(container, second_role);
    }

    let spacing = ctx.config.node_spacing;
    let ordered: Vec<&ChildBox> = match orientation {
        Orientation::Rotate270 => [second, first].into_iter().flatten().collect(),
        _ => [first, second].into_iter().flatten().collect(),
    };
    let mut slots = Vec::new();
    match orientation {
        Orientation::Horizontal | Orientation::HorizontalLine => {
            let row = ordered
                .iter()
                .map(|child| child.size.height)
                .fold(0.0f32, f32::max);
            let mut x = 0.0;
            for child in ordered {
                slots.push(Slot {
                    id: child.id,
                    offset: Point::new(x, (row - child.size.height) / 2.0),
                    size: child.size,
                });
                x += child.size.width + spacing.horizontal;
            }
        }
        Orientation::Vertical | Orientation::Rotate90 | Orientation::Rotate270 => {
            let column = ordered
                .iter()
                .map(|child| child.size.width)
                .fold(0.0f32, f32::max);
            let mut y = 0.0;
            for child in ordered {
                slots.push(Slot {
                    id: child.id,
                    offset: Point::new((column - child.size.width) / 2.0, y),
                    size: child.size,
                });
                y += child.size.height + spacing.vertical;
            }
        }
    }
    place_extras(&mut slots, &extras, spacing.horizontal, spacing.vertical);
    Plan::from_slots(slots)
}

pub fn infer_foundation_role(category: Option<&str>, label: &str) -> Option<SlotRole> {
    let classify = |text: &str| {
        let lower = text.to_ascii_lowercase();
        if lower.contains("raw") {
            Some(SlotRole::Raw)
        } else if lower.contains("base") {
            Some(SlotRole::Base)
        } else {
            None
        }
    };
    category.and_then(classify).or_else(|| classify(label))
}
