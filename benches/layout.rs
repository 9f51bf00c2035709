use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dashflow_layout::{Diagram, FixedMeasurer, LayoutConfig, NodeSpec, Size};
use std::hint::black_box;

/// `depth` nested lanes, each holding `width` leaves plus the next lane.
fn deep_tree(depth: usize, width: usize) -> NodeSpec {
    let mut spec = NodeSpec::new(format!("lane{depth}"), "lane")
        .with_children(leaves(&format!("d{depth}"), width));
    for level in (0..depth).rev() {
        let mut children = leaves(&format!("d{level}"), width);
        children.push(spec);
        spec = NodeSpec::new(format!("lane{level}"), "lane").with_children(children);
    }
    spec
}

/// One columns container of `groups` lanes with `width` leaves each.
fn wide_tree(groups: usize, width: usize) -> NodeSpec {
    let lanes = (0..groups)
        .map(|g| NodeSpec::new(format!("g{g}"), "lane").with_children(leaves(&format!("g{g}"), width)))
        .collect();
    NodeSpec::new("board", "columns").with_children(lanes)
}

fn leaves(prefix: &str, count: usize) -> Vec<NodeSpec> {
    (0..count)
        .map(|i| NodeSpec::leaf(format!("{prefix}_n{i}"), 80.0, 30.0))
        .collect()
}

fn diagram(spec: &NodeSpec) -> Diagram {
    Diagram::with_measurer(
        spec,
        LayoutConfig::default(),
        Box::new(FixedMeasurer::new(7.0, 16.0)),
    )
    .expect("build failed")
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for (name, spec) in [
        ("deep_20x5", deep_tree(20, 5)),
        ("deep_60x3", deep_tree(60, 3)),
        ("wide_10x20", wide_tree(10, 20)),
        ("wide_40x25", wide_tree(40, 25)),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &spec, |b, spec| {
            b.iter(|| black_box(diagram(black_box(spec))));
        });
    }
    group.finish();
}

fn bench_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("cascade");
    for (name, spec, leaf) in [
        ("deep_60x3", deep_tree(60, 3), "d60_n0"),
        ("wide_40x25", wide_tree(40, 25), "g39_n24"),
    ] {
        let mut diagram = diagram(&spec);
        let id = diagram.find(leaf).expect("leaf missing");
        let mut grow = false;
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                grow = !grow;
                let width = if grow { 160.0 } else { 80.0 };
                diagram
                    .resize(id, Size::new(width, 30.0))
                    .expect("resize failed");
            });
        });
    }
    group.finish();
}

fn bench_toggle(c: &mut Criterion) {
    let mut group = c.benchmark_group("toggle");
    for (name, spec, container) in [
        ("deep_60x3", deep_tree(60, 3), "lane30"),
        ("wide_40x25", wide_tree(40, 25), "g20"),
    ] {
        let mut diagram = diagram(&spec);
        let id = diagram.find(container).expect("container missing");
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| black_box(diagram.toggle(id).expect("toggle failed")));
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_build, bench_cascade, bench_toggle
);
criterion_main!(benches);
