//! Load a synthetic colour image into matrices of each format.
//!
//! Run with `RUST_LOG=snap=debug` to see the resolved routes.

use snap::prelude::*;

fn main() -> Result<()> {
    snap::utils::init_subscriber();

    let profile = snap::init()?;
    println!("snap - grey conversion demo\n");
    println!("Instruction set: {}", profile.instruction_set);
    println!("Alignment:       {} bytes\n", profile.alignment);

    // A 4 x 6 BGR gradient: blue rises along the row, red down the column
    let (rows, cols) = (4, 6);
    let mut image = ImageBuffer::new(rows, cols, FormatTag::Bgr24)?;
    {
        let mut view = image.view_mut();
        for r in 0..rows {
            for (c, px) in view.row_mut(r).chunks_exact_mut(3).enumerate() {
                px.copy_from_slice(&[(c * 50) as u8, 128, (r * 80) as u8]);
            }
        }
    }

    let bgr = DynamicMatrix::<Bgr24>::from_image(&image.view())?;
    println!(
        "Bgr24 matrix:  {} x {} scalars, step {}",
        bgr.rows(),
        bgr.cols(),
        bgr.step()
    );

    let mut grey = DynamicMatrix::<Grey8>::with_pixels(rows, cols)?;
    let route = convert(&image.view(), &mut grey)?;
    println!(
        "Grey8 matrix:  {} x {} scalars, step {} ({:?} route)\n",
        grey.rows(),
        grey.cols(),
        grey.step(),
        route
    );

    for r in 0..rows {
        let row: Vec<String> = grey.row(r).iter().map(|v| format!("{:>4}", v)).collect();
        println!("  {}", row.join(""));
    }

    // Back out through the colour path
    let mut bgra = ImageBuffer::new(rows, cols, FormatTag::Bgra32)?;
    let route = convert_into(&grey, &mut bgra.view_mut())?;
    println!("\nStored grey as BGRA_32 ({:?} route)", route);
    println!("First pixel: {:?}", &bgra.as_bytes()[..4]);

    Ok(())
}
