use std::path::PathBuf;

use clap::{Args, Parser};
use serde::Deserialize;
use svg::Document;

use ghclip::{binary_op, generators, BinaryOp, Contours, Point};

#[derive(Copy, Clone, Debug)]
enum Op {
    Binary(BinaryOp),
    ReverseDifference,
}

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
enum Example {
    Squares,
    KimKim,
    Comb,
    SlantedComb,
    Stars,
}

#[derive(Parser)]
struct Cli {
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    input: Input,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// A yaml file with `subject` and `clip` lists of points.
    input: Option<PathBuf>,

    #[arg(long)]
    example: Option<Example>,
}

#[derive(Deserialize)]
struct PolygonPair {
    subject: Vec<(f64, f64)>,
    clip: Vec<(f64, f64)>,
}

fn get_polygons(input: &Input) -> anyhow::Result<(Vec<Point>, Vec<Point>)> {
    match (&input.input, &input.example) {
        (Some(path), None) => {
            let input = std::fs::read_to_string(path)?;
            let pair: PolygonPair = serde_yaml::from_str(&input)?;
            let to_points = |ps: Vec<(f64, f64)>| ps.into_iter().map(Point::from).collect();
            Ok((to_points(pair.subject), to_points(pair.clip)))
        }
        (None, Some(example)) => Ok(match example {
            Example::Squares => (
                generators::rect(2.0, 2.0, 4.0, 4.0),
                generators::rect(4.0, 4.0, 4.0, 4.0),
            ),
            Example::KimKim => generators::kim_kim(),
            Example::Comb => generators::comb(5, 0.0),
            Example::SlantedComb => generators::comb(5, 5.0),
            Example::Stars => (
                generators::star(Point::new(0.0, 0.0), 7, 30.0, 60.0),
                generators::star(Point::new(20.0, 10.0), 5, 25.0, 50.0),
            ),
        }),
        _ => unreachable!(),
    }
}

pub fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let (shape_a, shape_b) = get_polygons(&args.input)?;

    let all = || shape_a.iter().chain(&shape_b);
    let min_x = all().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = all().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = all().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = all().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let pad = 1.0 + (max_x - min_x).max(max_y - min_y) / 20.0;
    let one_width = max_x - min_x + 2.0 * pad;
    let one_height = max_y - min_y + 2.0 * pad;
    let stroke_width = (max_y - min_y).max(max_x - min_x) / 512.0;
    let mut document = svg::Document::new().set(
        "viewBox",
        (min_x - pad, min_y - pad, one_width * 3.0, one_height * 2.0),
    );

    // Draw the inputs.
    for (c, color) in [(&shape_a, "#005F73"), (&shape_b, "#AE2012")] {
        let Some(p) = c.first() else {
            continue;
        };
        let mut data = svg::node::element::path::Data::new();
        data = data.move_to((p.x, p.y));
        for p in &c[1..] {
            data = data.line_to((p.x, p.y));
        }
        data = data.close();

        let path = svg::node::element::Path::new()
            .set("stroke", color)
            .set("stroke-width", stroke_width)
            .set("stroke-linecap", "round")
            .set("stroke-linejoin", "round")
            .set("opacity", 0.5)
            .set("fill", "none")
            .set("d", data);
        document = document.add(path);
    }

    let panels = [
        (Op::Binary(BinaryOp::Union), one_width, 0.0),
        (Op::Binary(BinaryOp::Intersection), one_width * 2.0, 0.0),
        (Op::Binary(BinaryOp::Xor), 0.0, one_height),
        (Op::Binary(BinaryOp::Difference), one_width, one_height),
        (Op::ReverseDifference, one_width * 2.0, one_height),
    ];
    for (op, x_off, y_off) in panels {
        let contours = match op {
            Op::Binary(op) => binary_op(&shape_a, &shape_b, op)?,
            Op::ReverseDifference => binary_op(&shape_b, &shape_a, BinaryOp::Difference)?,
        };
        eprintln!("{op:?}: {} contours, area {}", contours.len(), contours.area());
        document = add_contours(document, &contours, x_off, y_off, stroke_width);
    }

    svg::save(&args.output, &document)?;

    Ok(())
}

fn add_contours(
    mut doc: Document,
    contours: &Contours,
    x_off: f64,
    y_off: f64,
    stroke_width: f64,
) -> Document {
    let colors = [
        "#005F73", "#0A9396", "#94D2BD", "#E9D8A6", "#EE9B00", "#CA6702", "#BB3E03", "#AE2012",
        "#9B2226",
    ];

    let mut color_idx = 0;
    for group in contours.grouped() {
        let mut data = svg::node::element::path::Data::new();

        for contour_idx in group {
            let mut contour = contours[contour_idx].points.iter().cloned();
            let Some(p) = contour.next() else {
                continue;
            };

            data = data.move_to((p.x + x_off, p.y + y_off));
            for p in contour {
                data = data.line_to((p.x + x_off, p.y + y_off));
            }
            data = data.close();
        }
        // Holes come out in whatever orientation the inputs had.
        let path = svg::node::element::Path::new()
            .set("d", data)
            .set("fill-rule", "evenodd")
            .set("stroke", "black")
            .set("stroke-width", stroke_width)
            .set("stroke-linecap", "round")
            .set("stroke-linejoin", "round")
            .set("fill", colors[color_idx]);
        doc = doc.add(path);
        color_idx = (color_idx + 1) % colors.len();
    }
    doc
}
