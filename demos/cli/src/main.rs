use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{info, warn};

use fnplot::{
    chart::{Chart, ChartOptions, DatumSamples, Sampled},
    datum::GraphType,
    sampler::{IntervalSamples, PointSamples, View},
};

/// Samples the functions in a chart description
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    cmd: Command,

    /// Input file (JSON chart options)
    #[clap(short, long)]
    input: PathBuf,

    /// Number of times to sample (for benchmarking)
    #[clap(short = 'N', default_value_t = 1)]
    n: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of the samples for each datum
    Summary,

    /// Print the samples as JSON
    Json {
        /// Pretty-print the output
        #[clap(long)]
        pretty: bool,
    },

    /// Rasterize the samples into an image
    Render {
        /// Name of a `.png` file to write
        #[clap(short, long)]
        out: PathBuf,
    },
}

////////////////////////////////////////////////////////////////////////////////

const PALETTE: [[u8; 3]; 6] = [
    [0x1f, 0x77, 0xb4],
    [0xff, 0x7f, 0x0e],
    [0x2c, 0xa0, 0x2c],
    [0xd6, 0x27, 0x28],
    [0x94, 0x67, 0xbd],
    [0x8c, 0x56, 0x4b],
];

/// RGBA image covering the whole chart, including margins
struct Canvas {
    width: u32,
    height: u32,
    data: Vec<u8>,
    /// Plotting area, as `[x0, y0, x1, y1]` in image pixels
    clip: [f64; 4],
}

impl Canvas {
    fn new(chart: &Chart) -> Self {
        let opts = chart.options();
        let (w, h) = chart.size();
        let m = chart.margin();
        let mut c = Self {
            width: opts.width,
            height: opts.height,
            data: vec![0xFF; opts.width as usize * opts.height as usize * 4],
            clip: [m.left, m.top, m.left + w, m.top + h],
        };
        // Light frame around the plotting area
        for x in c.clip[0] as u32..c.clip[2] as u32 {
            for y in [c.clip[1] as u32, c.clip[3] as u32] {
                c.put_raw(x, y, [0xC0; 3]);
            }
        }
        c
    }

    fn put_raw(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x < self.width && y < self.height {
            let i = (y as usize * self.width as usize + x as usize) * 4;
            self.data[i..i + 3].copy_from_slice(&rgb);
        }
    }

    /// Sets a pixel given plot-area coordinates
    fn put(&mut self, x: f64, y: f64, rgb: [u8; 3]) {
        let px = x + self.clip[0];
        let py = y + self.clip[1];
        if px >= self.clip[0]
            && px < self.clip[2]
            && py >= self.clip[1]
            && py < self.clip[3]
        {
            self.put_raw(px as u32, py as u32, rgb);
        }
    }

    /// Fills a rectangle given plot-area coordinates (in any order)
    fn fill(&mut self, xs: [f64; 2], ys: [f64; 2], rgb: [u8; 3]) {
        let w = self.clip[2] - self.clip[0];
        let h = self.clip[3] - self.clip[1];
        let x0 = xs[0].min(xs[1]).clamp(0.0, w).floor() as u32;
        let x1 = xs[0].max(xs[1]).clamp(0.0, w).ceil().max(x0 as f64 + 1.0);
        let y0 = ys[0].min(ys[1]).clamp(0.0, h).floor() as u32;
        let y1 = ys[0].max(ys[1]).clamp(0.0, h).ceil().max(y0 as f64 + 1.0);
        for x in x0..x1 as u32 {
            for y in y0..y1 as u32 {
                self.put(x as f64, y as f64, rgb);
            }
        }
    }

    /// Draws a line segment given plot-area coordinates
    fn line(&mut self, a: [f64; 2], b: [f64; 2], rgb: [u8; 3]) {
        let steps = (b[0] - a[0]).abs().max((b[1] - a[1]).abs()).ceil();
        let steps = steps.clamp(1.0, 1e5) as usize;
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            self.put(a[0] + t * (b[0] - a[0]), a[1] + t * (b[1] - a[1]), rgb);
        }
    }

    fn polyline(
        &mut self,
        view: &View,
        s: &PointSamples,
        dots: bool,
        rgb: [u8; 3],
    ) {
        for run in &s.runs {
            let pts: Vec<[f64; 2]> = run
                .iter()
                .map(|[x, y]| [view.x.map(*x), view.y.map(*y)])
                .collect();
            if dots {
                for [px, py] in &pts {
                    self.fill([px - 1.0, px + 1.0], [py - 1.0, py + 1.0], rgb);
                }
            } else {
                for w in pts.windows(2) {
                    self.line(w[0], w[1], rgb);
                }
            }
        }
    }

    fn draw(&mut self, view: &View, d: &DatumSamples, rgb: [u8; 3]) {
        match &d.samples {
            Sampled::Interval(IntervalSamples::Cells(s)) => {
                for c in s.cells.iter().flatten() {
                    self.fill(
                        [view.x.map(c.x.lower()), view.x.map(c.x.upper())],
                        [view.y.map(c.y.lower()), view.y.map(c.y.upper())],
                        rgb,
                    );
                }
            }
            Sampled::Interval(IntervalSamples::Regions(r)) => {
                for c in &r.regions {
                    self.fill(
                        [view.x.map(c.x.lower()), view.x.map(c.x.upper())],
                        [view.y.map(c.y.lower()), view.y.map(c.y.upper())],
                        rgb,
                    );
                }
            }
            Sampled::BuiltIn(s) => {
                let dots = d.graph_type == GraphType::Scatter;
                self.polyline(view, s, dots, rgb);
            }
        }
        let helper = [0x80; 3];
        if let Some(t) = &d.derivative {
            self.polyline(view, t, false, helper);
        }
        for s in d.secants.iter().flatten() {
            self.polyline(view, s, false, helper);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

fn summarize(i: usize, d: &DatumSamples) -> String {
    let body = match &d.samples {
        Sampled::Interval(IntervalSamples::Cells(s)) => format!(
            "{} cells ({} indeterminate), {:.2} px/cell",
            s.cells.len(),
            s.cells.len() - s.defined(),
            s.scaled_dx
        ),
        Sampled::Interval(IntervalSamples::Regions(r)) => {
            format!("{} regions", r.regions.len())
        }
        Sampled::BuiltIn(s) => {
            format!("{} points in {} runs", s.len(), s.runs.len())
        }
    };
    format!(
        "data[{i}] ({}{}): {body}",
        d.graph_type,
        if d.closed { ", closed" } else { "" }
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .init();

    let now = Instant::now();
    let args = Args::parse();
    let file = std::fs::File::open(&args.input)?;
    let opts: ChartOptions = serde_json::from_reader(file)?;
    let mut chart = Chart::build(opts)?;
    info!("Loaded chart in {:?}", now.elapsed());

    let start = Instant::now();
    let mut out = vec![];
    for _ in 0..args.n.max(1) {
        out = chart.draw();
    }
    info!(
        "Sampled {}x at {:?} ms/frame ({} compilations)",
        args.n,
        start.elapsed().as_micros() as f64 / 1000.0 / (args.n.max(1) as f64),
        chart.compile_count()
    );
    for (i, r) in out.iter().enumerate() {
        if let Err(e) = r {
            warn!("data[{i}] failed: {e}");
        }
    }

    match args.cmd {
        Command::Summary => {
            for (i, r) in out.iter().enumerate() {
                if let Ok(d) = r {
                    println!("{}", summarize(i, d));
                }
            }
        }
        Command::Json { pretty } => {
            let ok: Vec<Option<&DatumSamples>> =
                out.iter().map(|r| r.as_ref().ok()).collect();
            let s = if pretty {
                serde_json::to_string_pretty(&ok)?
            } else {
                serde_json::to_string(&ok)?
            };
            println!("{s}");
        }
        Command::Render { out: path } => {
            let mut canvas = Canvas::new(&chart);
            for (i, r) in out.iter().enumerate() {
                if let Ok(d) = r {
                    canvas.draw(chart.view(), d, PALETTE[i % PALETTE.len()]);
                }
            }
            info!("Writing image to {path:?}");
            image::save_buffer(
                path,
                &canvas.data,
                canvas.width,
                canvas.height,
                image::ColorType::Rgba8,
            )?;
        }
    }

    Ok(())
}
