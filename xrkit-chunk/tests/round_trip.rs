use xrkit_chunk::{
    binary::{DryRunSink, ErrorKind, MemorySink, Sink},
    ChunkReader, ChunkWriter, LzoCodec, CHUNK_COMPRESSED,
};
use xrkit_core::string::RawString;
use xrkit_scrambler::{CipherConfig, Scrambler};

fn spawn_list(writer: &mut ChunkWriter<impl Sink>) {
    writer.open_chunk(0).unwrap();
    for (i, name) in ["stalker", "bandit", "dog"].into_iter().enumerate() {
        writer.open_chunk(i as u32).unwrap();
        writer.open_chunk(0).unwrap();
        writer.write_sz(name).unwrap();
        writer.close_chunk().unwrap();
        writer.open_chunk(1).unwrap();
        writer.write_f32(i as f32 * 1.5).unwrap();
        writer.write_u16(i as u16).unwrap();
        writer.close_chunk().unwrap();
        writer.close_chunk().unwrap();
    }
    writer.close_chunk().unwrap();
    writer.write_raw_chunk(1, b"trailer").unwrap();
}

#[test]
fn nested_chunks_read_back() {
    let mut writer = ChunkWriter::in_memory();
    spawn_list(&mut writer);
    let bytes = writer.finish().unwrap().into_inner();

    let mut root = ChunkReader::new(&bytes);
    let mut list = root.open_chunk(0).unwrap().unwrap();
    let entries = list
        .read_chunks(|entry| {
            let mut name = entry.open_chunk(0)?.unwrap();
            let name = name.read_sz()?;
            let mut position = entry.open_chunk(1)?.unwrap();
            Ok((name, position.read_f32()?, position.read_u16()?))
        })
        .unwrap();
    assert_eq!(
        entries,
        [
            (RawString::from("stalker"), 0.0, 0),
            (RawString::from("bandit"), 1.5, 1),
            (RawString::from("dog"), 3.0, 2),
        ]
    );

    let mut trailer = [0; 16];
    assert_eq!(root.read_raw_chunk(1, &mut trailer).unwrap(), Some(7));
    assert_eq!(&trailer[..7], b"trailer");
}

#[test]
fn nested_u32_lookup() {
    let mut writer = ChunkWriter::in_memory();
    writer.open_chunk(0).unwrap();
    writer.open_chunk(1).unwrap();
    writer.write_u32(42).unwrap();
    writer.close_chunk().unwrap();
    writer.close_chunk().unwrap();
    let bytes = writer.finish().unwrap().into_inner();
    assert_eq!(
        bytes,
        [0, 0, 0, 0, 12, 0, 0, 0, 1, 0, 0, 0, 4, 0, 0, 0, 42, 0, 0, 0]
    );

    let mut root = ChunkReader::new(&bytes);
    let mut outer = root.open_chunk(0).unwrap().unwrap();
    let mut inner = outer.open_chunk(1).unwrap().unwrap();
    assert_eq!(inner.read_u32().unwrap(), 42);
    assert!(inner.eof());
    assert!(outer.open_chunk(2).unwrap().is_none());
    assert_eq!(outer.read_chunk::<u32>(1).unwrap(), Some(42));
}

#[test]
fn dry_run_matches_the_real_size() {
    let mut real = ChunkWriter::in_memory();
    spawn_list(&mut real);
    let mut dry = ChunkWriter::new(DryRunSink::new());
    spawn_list(&mut dry);

    let real = real.finish().unwrap();
    let dry = dry.finish().unwrap();
    assert_eq!(dry.high_water_mark(), real.len());
    assert_eq!(dry.tell(), real.tell());
}

#[test]
fn enumeration_reports_ids_in_storage_order() {
    let mut writer = ChunkWriter::in_memory();
    for id in [5, 2, 5, 9] {
        writer.write_raw_chunk(id, &[id as u8]).unwrap();
    }
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = ChunkReader::new(&bytes);
    let mut seen = vec![];
    let mut prev = None;
    while let Some((id, mut chunk)) = reader.open_chunk_next(prev.take()).unwrap() {
        seen.push((id, chunk.read_u8().unwrap()));
        prev = Some(chunk);
    }
    assert_eq!(seen, [(5, 5), (2, 2), (5, 5), (9, 9)]);

    let ids: Vec<u32> = reader
        .chunks()
        .map(|entry| entry.unwrap().0.id)
        .collect();
    assert_eq!(ids, [5, 2, 5, 9]);
}

#[test]
fn compressed_chunks_go_through_the_codec() {
    let payload: Vec<u8> = b"[logic]\r\nactive = walker\r\n"
        .iter()
        .copied()
        .cycle()
        .take(2000)
        .collect();

    let mut writer = ChunkWriter::in_memory();
    writer.write_compressed_chunk(3, &payload, &LzoCodec).unwrap();
    let bytes = writer.finish().unwrap().into_inner();
    assert_eq!(
        u32::from_le_bytes(bytes[..4].try_into().unwrap()),
        3 | CHUNK_COMPRESSED
    );
    assert!(bytes.len() < payload.len());

    let mut reader = ChunkReader::new(&bytes);
    assert_eq!(
        reader.open_chunk(3).unwrap_err().kind(),
        ErrorKind::MissingCodec
    );

    let mut reader = ChunkReader::new(&bytes).with_codec(&LzoCodec);
    let header = reader.find_chunk(3, true).unwrap().unwrap();
    assert!(header.compressed);
    let chunk = reader.open_chunk(3).unwrap().unwrap();
    assert!(chunk.is_owned());
    assert_eq!(chunk.bytes(), payload.as_slice());
}

#[test]
fn compressed_chunks_inherit_the_codec() {
    let mut inner = ChunkWriter::in_memory();
    inner.write_compressed_chunk(1, &[4; 300], &LzoCodec).unwrap();
    let inner = inner.finish().unwrap().into_inner();

    let mut writer = ChunkWriter::in_memory();
    writer.write_raw_chunk(7, &inner).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = ChunkReader::new(&bytes).with_codec(&LzoCodec);
    let mut outer = reader.open_chunk(7).unwrap().unwrap();
    let chunk = outer.open_chunk(1).unwrap().unwrap();
    assert_eq!(chunk.bytes(), [4; 300]);
}

#[test]
fn scrambled_chunks() {
    let scrambler = Scrambler::shared(CipherConfig::Ru);
    let text = b"section_name = value\r\n";

    let mut writer = ChunkWriter::in_memory();
    writer.write_scrambled_chunk(2, text, scrambler).unwrap();
    let bytes = writer.finish().unwrap().into_inner();
    assert_ne!(&bytes[8..], text);

    let mut reader = ChunkReader::new(&bytes);
    let mut chunk = reader
        .open_chunk_scrambled(2, scrambler)
        .unwrap()
        .unwrap();
    assert_eq!(chunk.read_line().unwrap(), "section_name = value");
    assert!(chunk.eof());

    let ww = Scrambler::shared(CipherConfig::Ww);
    let wrong = reader.open_chunk_scrambled(2, ww).unwrap().unwrap();
    assert_ne!(wrong.bytes(), text);
}

#[test]
fn strings_in_chunks() {
    let mut writer = ChunkWriter::in_memory();
    writer.open_chunk(4).unwrap();
    writer.write_sz("gar_bandit_boss\0").unwrap();
    writer.close_chunk().unwrap();
    writer.open_chunk(5).unwrap();
    writer.write_line("first").unwrap();
    writer.write_line("second").unwrap();
    writer.close_chunk().unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = ChunkReader::new(&bytes);
    assert_eq!(
        reader.read_chunk::<RawString>(4).unwrap().unwrap(),
        "gar_bandit_boss"
    );
    let mut lines = reader.open_chunk(5).unwrap().unwrap();
    assert_eq!(lines.read_line().unwrap(), "first");
    assert_eq!(lines.read_line().unwrap(), "second");
    assert!(lines.eof());
}

#[test]
fn owned_readers_outlive_their_source() {
    let mut writer = ChunkWriter::in_memory();
    writer.write_raw_chunk(1, &[1, 2, 3]).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let chunk = {
        let mut reader = ChunkReader::from_owned(bytes);
        reader.open_chunk(1).unwrap().unwrap()
    };
    assert!(chunk.is_owned());
    assert_eq!(chunk.bytes(), [1, 2, 3]);
}

#[test]
fn memory_sink_can_be_saved_elsewhere() {
    let mut writer = ChunkWriter::in_memory();
    writer.write_raw_chunk(0, b"x").unwrap();
    let sink = writer.finish().unwrap();

    let mut copy = MemorySink::new();
    sink.save_to(&mut copy).unwrap();
    assert_eq!(copy.as_bytes(), sink.as_bytes());
}

#[test]
fn sub_readers_move_to_other_threads() {
    let mut writer = ChunkWriter::in_memory();
    writer.open_chunk(1).unwrap();
    writer.write_u32(42).unwrap();
    writer.close_chunk().unwrap();
    writer.write_compressed_chunk(2, &[8; 400], &LzoCodec).unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let mut reader = ChunkReader::new(&bytes).with_codec(&LzoCodec);
    let mut plain = reader.open_chunk(1).unwrap().unwrap();
    let mut unpacked = reader.open_chunk(2).unwrap().unwrap();
    std::thread::scope(|s| {
        let first = s.spawn(move || plain.read_u32());
        let second = s.spawn(move || unpacked.read_seq::<u8>(400));
        assert_eq!(first.join().unwrap().unwrap(), 42);
        assert_eq!(second.join().unwrap().unwrap(), vec![8; 400]);
    });
}
