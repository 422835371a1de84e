#![no_main]

use arbitrary::Unstructured;
use ghclip::arbitrary::lattice_rect;
use ghclip::{binary_op, BinaryOp, Contour};
use libfuzzer_sys::fuzz_target;

// Rectangles on a small lattice share corners and edges all the time, which
// exercises the degenerate cases of intersection discovery.
fn run(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
    let a = lattice_rect(u)?;
    let b = lattice_rect(u)?;
    let area_a = Contour::new(a.clone()).signed_area().abs();
    let area_b = Contour::new(b.clone()).signed_area().abs();

    let area = |op| binary_op(&a, &b, op).map(|c| c.area());
    if let (Ok(union), Ok(intersection)) = (area(BinaryOp::Union), area(BinaryOp::Intersection)) {
        assert!(
            (union + intersection - area_a - area_b).abs() < 1e-9,
            "{a:?} {b:?}: union {union}, intersection {intersection}"
        );
    }
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let _ = run(&mut u);
});
