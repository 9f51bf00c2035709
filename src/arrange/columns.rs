use super::*;

/// Horizontal row in child order, each child centered vertically.
pub(super) fn plan(children: &[ChildBox], spacing: f32) -> Plan {
    let height = children
        .iter()
        .map(|child| child.size.height)
        .fold(0.0f32, f32::max);
    let mut x_cursor = 0.0f32;
    let mut slots = Vec::with_capacity(children.len());
    for (idx, child) in children.iter().enumerate() {
        if idx > 0 {
            x_cursor += spacing;
        }
        slots.push(Slot {
            id: child.id,
            offset: Point::new(x_cursor, (height - child.size.height) / 2.0),
            size: child.size,
        });
        x_cursor += child.size.width;
    }
    Plan {
        slots,
        size: Size::new(x_cursor, height),
    }
}
