//! Encode an SVG file into compact bytes and report what the tables collapsed.
//!
//! Usage: `cargo run --example encode_svg -- input.svg [output.vgc]`

use vgc::{EncodeOpts, Encoder, FloatWidth, Rect, Representation, ScalableImage};

const FALLBACK_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
  <circle cx="50" cy="50" r="40" fill="green"/>
  <rect x="70" y="70" width="20" height="20" fill="blue"/>
  <rect x="70" y="5" width="20" height="20" fill="blue"/>
</svg>"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let input = args.next();
    let output = args.next();

    let data = match &input {
        Some(path) => std::fs::read(path)?,
        None => {
            eprintln!("encode_svg: no input given, using a built-in document");
            FALLBACK_SVG.as_bytes().to_vec()
        }
    };

    let opts = EncodeOpts {
        float_width: FloatWidth::F32,
    };
    let compact = vgc::frontend::build_svg(&data, Encoder::new(opts))?;
    let bytes = compact.to_bytes()?;
    let [images, strings, floats, transforms, paths] = compact.table_counts();
    println!(
        "svg {} bytes -> compact {} bytes (images {images}, strings {strings}, float lists {floats}, transforms {transforms}, paths {paths}, gradients {})",
        data.len(),
        bytes.len(),
        compact.gradient_count()
    );

    let image = ScalableImage::from_bytes(&bytes, Representation::Graph)?;
    let viewport = image.viewport()?;
    println!("viewport {:?} scale {:?}", viewport.rect, viewport.scale);

    let half = Rect::new(
        viewport.rect.x0,
        viewport.rect.y0,
        viewport.rect.center().x,
        viewport.rect.y1,
    );
    let pruned = image.with_new_viewport(half, true, 0.0)?;
    println!(
        "left half keeps {} of {} primitives",
        pruned.primitives()?.len(),
        image.primitives()?.len()
    );

    if let Some(path) = output {
        std::fs::write(&path, &bytes)?;
        println!("wrote {path}");
    }
    Ok(())
}
