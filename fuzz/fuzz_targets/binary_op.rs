#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use ghclip::arbitrary::star_shaped_polygon;
use ghclip::{binary_op, BinaryOp, Contour};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Union,
    Intersection,
    Difference,
    Xor,
}

impl Op {
    fn binary_op(self) -> BinaryOp {
        match self {
            Op::Union => BinaryOp::Union,
            Op::Intersection => BinaryOp::Intersection,
            Op::Difference => BinaryOp::Difference,
            Op::Xor => BinaryOp::Xor,
        }
    }
}

fn run(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
    let (_, a) = star_shaped_polygon(u)?;
    let (_, b) = star_shaped_polygon(u)?;
    let op: Op = u.arbitrary()?;

    // Inconsistencies are reported as errors; we're only looking for panics
    // and wildly wrong areas here.
    if let Ok(contours) = binary_op(&a, &b, op.binary_op()) {
        let area_a = Contour::new(a).signed_area().abs();
        let area_b = Contour::new(b).signed_area().abs();
        let area = contours.area();
        assert!(area >= -1e-6 * (area_a + area_b));
        assert!(area <= (area_a + area_b) * (1.0 + 1e-6));
    }
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let _ = run(&mut u);
});
