use criterion::{
    BenchmarkId, Criterion, black_box, criterion_group, criterion_main,
};
use fnplot::{
    Expression,
    chart::{Chart, ChartOptions},
    eval::{Compiled, Evaluator, Rounding, Scope},
    sampler::{QuadTreeSampler, RangeSampler},
    scale::{AxisType, Scale},
    types::Interval,
};

fn evaluator(s: &str, rounding: Rounding) -> Evaluator<Interval> {
    let f = Compiled::new(&Expression::from(s)).unwrap();
    Evaluator::new(f).with_rounding(rounding)
}

pub fn range_sweep(c: &mut Criterion) {
    let x = Scale::new('x', AxisType::Linear, [-10.0, 10.0], [0.0, 1000.0])
        .unwrap();
    let scope = Scope::new();

    let mut group = c.benchmark_group("1D interval sampling (sin(x) / x)");
    for n in [100, 500, 1000, 2200] {
        let sampler =
            RangeSampler::new(&x, [-10.0, 10.0], [-1.0, 1.0], n).unwrap();
        for rounding in [Rounding::Relaxed, Rounding::Outward] {
            let mut eval = evaluator("sin(x) / x", rounding);
            group.bench_function(
                BenchmarkId::new(rounding.to_string(), n),
                |b| b.iter(|| black_box(sampler.sample(&mut eval, &scope))),
            );
        }
    }
}

pub fn quad_tree_sweep(c: &mut Criterion) {
    let scope = Scope::new();
    let mut group = c.benchmark_group("quad-tree sampling (unit circle)");
    for pixels in [128, 256, 512, 1024] {
        let rect_eps = 4.0 / pixels as f64;
        let sampler =
            QuadTreeSampler::new([-2.0, 2.0], [-2.0, 2.0], rect_eps).unwrap();
        let mut eval = evaluator("x^2 + y^2 - 1", Rounding::Relaxed);
        group.bench_function(BenchmarkId::new("relaxed", pixels), |b| {
            b.iter(|| black_box(sampler.sample(&mut eval, &scope)))
        });
    }
}

pub fn chart_redraw(c: &mut Criterion) {
    let opts: ChartOptions = serde_json::from_str(
        r#"{ "data": [
            { "fn": "tan(x)" },
            { "fn": "sin(x * y) - 0.5", "fnType": "implicit" },
            { "fn": "exp(-x^2)", "graphType": "polyline" }
        ] }"#,
    )
    .unwrap();
    let mut chart = Chart::build(opts).unwrap();
    c.bench_function("chart redraw (warm cache)", |b| {
        b.iter(|| black_box(chart.draw()))
    });
}

criterion_group!(benches, range_sweep, quad_tree_sweep, chart_redraw);
criterion_main!(benches);
