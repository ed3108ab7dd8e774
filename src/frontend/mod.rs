/// SVG markup front end built on `usvg`.
pub mod svg;

pub use svg::{build_svg, build_tree, parse_tree, svg_to_image};
