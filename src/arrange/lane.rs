use super::*;

/// Vertical stack in child order, each child centered horizontally.
pub(super) fn plan(children: &[ChildBox], spacing: f32) -> Plan {
    let width = children
        .iter()
        .map(|child| child.size.width)
        .fold(0.0f32, f32::max);
    let mut y_cursor = 0.0f32;
    let last_idx = children.len().saturating_sub(1);
    let mut slots = Vec::with_capacity(children.len());
    for (idx, child) in children.iter().enumerate() {
        slots.push(Slot {
            id: child.id,
            offset: Point::new((width - child.size.width) / 2.0, y_cursor),
            size: child.size,
        });
        y_cursor += child.size.height;
        if idx < last_idx {
            y_cursor += spacing;
        }
    }
    Plan {
        slots,
        size: Size::new(width, y_cursor),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::child;
    use super::*;

    #[test]
    fn stacks_in_insertion_order() {
        let children = vec![
            child(1, 80.0, 40.0),
            child(2, 80.0, 60.0),
            child(3, 80.0, 30.0),
        ];
        let plan = plan(&children, 10.0);
        assert_eq!(plan.size, Size::new(80.0, 150.0));
        let offsets: Vec<f32> = plan.slots.iter().map(|slot| slot.offset.y).collect();
        assert_eq!(offsets, vec![0.0, 50.0, 120.0]);
    }

    #[test]
    fn width_is_widest_child() {
        let children = vec![child(1, 30.0, 10.0), child(2, 90.0, 10.0)];
        let plan = plan(&children, 5.0);
        assert_eq!(plan.size.width, 90.0);
        assert_eq!(plan.slots[0].offset.x, 30.0);
        assert_eq!(plan.slots[1].offset.x, 0.0);
    }

    #[test]
    fn single_child_has_no_spacing() {
        let plan = plan(&[child(1, 10.0, 25.0)], 10.0);
        assert_eq!(plan.size, Size::new(10.0, 25.0));
    }
}
