use super::*;
use crate::canon::tables::TableInterner;
use crate::compact::format::FloatWidth;
use crate::model::path::PathSink;

fn sample_tables() -> TableSet {
    let mut t = TableInterner::new();
    t.image(&Arc::new(ImageData::new(2, 3, vec![1u8, 2, 3]))).unwrap();
    t.string(&Arc::from("héllo")).unwrap();
    t.float_list(&[0.25, 1.0 / 3.0]).unwrap();
    t.transform(&Affine::new([1.0, 0.5, -0.5, 1.0, 10.0, 20.0]))
        .unwrap();
    let mut p = PathData::new();
    PathSink::<f64>::move_to(&mut p, 0.0, 0.0);
    PathSink::<f64>::cubic_to(&mut p, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
    PathSink::<f64>::close(&mut p);
    t.path(&p).unwrap();
    (*t.snapshot()).clone()
}

#[test]
fn f64_tables_read_back_exactly() {
    let tables = sample_tables();
    let mut w = ByteWriter::new(FloatWidth::F64);
    write_tables(&mut w, &tables).unwrap();
    let bytes = w.into_bytes();

    let mut r = ByteReader::new(&bytes, FloatWidth::F64);
    let back = read_tables(&mut r).unwrap();
    assert!(r.is_empty());
    assert_eq!(back.counts(), tables.counts());
    assert_eq!(*back.image(0).unwrap(), *tables.image(0).unwrap());
    assert_eq!(&*back.string(0).unwrap(), "héllo");
    assert_eq!(&back.float_list(0).unwrap()[..], &[0.25, 1.0 / 3.0]);
    assert_eq!(back.transform(0).unwrap(), tables.transform(0).unwrap());
    assert_eq!(*back.path(0).unwrap(), *tables.path(0).unwrap());
}

#[test]
fn document_keeps_full_precision_and_absent_fields() {
    let doc = DocumentAttrs {
        width: Some(1.0 / 3.0),
        height: None,
        view_box: Some(Rect::new(-1.5, 0.0, 2.0, 1e9 + 0.5)),
        tint: Some(Color::rgba(1, 2, 3, 4)),
    };
    let mut w = ByteWriter::new(FloatWidth::F32);
    write_document(&mut w, &doc);
    let bytes = w.into_bytes();
    let back = read_document(&mut ByteReader::new(&bytes, FloatWidth::F32)).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn invalid_utf8_in_string_table_is_format_error() {
    let mut w = ByteWriter::new(FloatWidth::F32);
    w.varint(0);
    w.varint(1);
    w.varint(2);
    w.bytes(&[0xc3, 0x28]);
    let bytes = w.into_bytes();
    let err = read_tables(&mut ByteReader::new(&bytes, FloatWidth::F32)).unwrap_err();
    assert!(err.is_format());
}

#[test]
fn ops_resolve_table_references() {
    let tables = sample_tables();
    let mut w = ByteWriter::new(FloatWidth::F32);
    w.u8(Opcode::Path as u8);
    w.varint(0);
    w.u8(PAINT_FILL);
    w.u8(SOURCE_SOLID);
    w.u32(Color::BLACK.to_argb());
    w.u8(FillRule::EvenOdd.code());
    w.opt_index(Some(0));
    w.u8(Opcode::EndGroup as u8);
    let bytes = w.into_bytes();

    let mut ops = OpReader::new(ByteReader::new(&bytes, FloatWidth::F32), &tables);
    let Some(Op::Path {
        path,
        paint,
        transform,
    }) = ops.next_op().unwrap()
    else {
        panic!("expected a path op");
    };
    assert!(Arc::ptr_eq(&path, &tables.path(0).unwrap()));
    assert_eq!(paint.fill.map(|f| f.rule), Some(FillRule::EvenOdd));
    assert_eq!(transform, Some(tables.transform(0).unwrap()));
    assert_eq!(ops.next_op().unwrap(), Some(Op::EndGroup));
    assert_eq!(ops.next_op().unwrap(), None);
}

#[test]
fn bad_opcodes_and_indices_are_rejected() {
    let tables = sample_tables();

    let bytes = [0x7f];
    let mut ops = OpReader::new(ByteReader::new(&bytes, FloatWidth::F32), &tables);
    assert!(ops.next_op().unwrap_err().is_format());

    let bytes = [Opcode::ClipPath as u8, 9, 0, 0];
    let mut ops = OpReader::new(ByteReader::new(&bytes, FloatWidth::F32), &tables);
    assert!(ops.next_op().unwrap_err().is_structural());

    let bytes = [Opcode::Use as u8];
    let mut ops = OpReader::new(ByteReader::new(&bytes, FloatWidth::F32), &tables);
    assert!(ops.next_op().unwrap_err().is_format());
}

#[test]
fn operand_count_mismatch_is_format_error() {
    // Float list 0 has two values; a rect needs six.
    let tables = sample_tables();
    let bytes = [Opcode::Rect as u8, 0, 0, 0];
    let mut ops = OpReader::new(ByteReader::new(&bytes, FloatWidth::F32), &tables);
    assert!(ops.next_op().unwrap_err().is_format());
}
