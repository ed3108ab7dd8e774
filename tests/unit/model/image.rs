use super::*;

#[test]
fn from_encoded_reads_png_size() {
    let img = image::RgbaImage::from_raw(3, 2, vec![0u8; 3 * 2 * 4]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let data = ImageData::from_encoded(buf).unwrap();
    assert_eq!((data.width, data.height), (3, 2));
}

#[test]
fn from_encoded_rejects_garbage() {
    assert!(ImageData::from_encoded(vec![1u8, 2, 3]).is_err());
}
