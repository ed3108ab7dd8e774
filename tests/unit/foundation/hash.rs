use super::*;

#[test]
fn equal_floats_share_digest_and_signed_zero_does_not() {
    let mut a = KeyWriter::new();
    [1.0, 2.5].as_slice().write_key(&mut a);
    let mut b = KeyWriter::new();
    vec![1.0, 2.5].as_slice().write_key(&mut b);
    assert_eq!(a.as_bytes(), b.as_bytes());
    assert_eq!(a.digest(), b.digest());

    let mut z = KeyWriter::new();
    z.write_f64(0.0);
    let mut nz = KeyWriter::new();
    nz.write_f64(-0.0);
    assert_ne!(z.as_bytes(), nz.as_bytes());
}

#[test]
fn length_prefix_separates_adjacent_strings() {
    let mut a = KeyWriter::new();
    "ab".write_key(&mut a);
    "c".write_key(&mut a);
    let mut b = KeyWriter::new();
    "a".write_key(&mut b);
    "bc".write_key(&mut b);
    assert_ne!(a.as_bytes(), b.as_bytes());
}
