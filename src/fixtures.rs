//! Fixture builders shared by unit tests.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use zip::write::FileOptions;

static COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn temp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "jvm_names_test_{}_{}_{}_{}",
        std::process::id(),
        nanos,
        n,
        name
    ))
}

pub fn write_jar(path: &Path, entries: &[(&str, &[u8])]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }

    zip.finish().unwrap();
}

/// Rewrites the compression method of `entry_name` in both its local header
/// and its central-directory record.
pub fn set_compression_method(jar: &Path, entry_name: &str, method: u16) {
    let mut bytes = std::fs::read(jar).unwrap();
    let name = entry_name.as_bytes();
    let positions: Vec<usize> = bytes
        .windows(name.len())
        .enumerate()
        .filter(|(_, w)| *w == name)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(positions.len(), 2, "expected one local and one central name");
    // Local header: name at +30, method at +8. Central record: name at +46, method at +10.
    let local = positions[0] - 30;
    let central = positions[1] - 46;
    assert_eq!(&bytes[local..local + 4], b"PK\x03\x04");
    assert_eq!(&bytes[central..central + 4], b"PK\x01\x02");
    bytes[local + 8..local + 10].copy_from_slice(&method.to_le_bytes());
    bytes[central + 10..central + 12].copy_from_slice(&method.to_le_bytes());
    std::fs::write(jar, bytes).unwrap();
}

/// Builds a class file that exercises every skip path of the reader: one
/// constant of each tag, two interfaces, a field with a `ConstantValue`
/// attribute, a method whose `Code` body is garbage, and `InnerClasses` and
/// `BootstrapMethods` attributes ahead of `SourceFile`.
pub fn class_bytes(internal_name: &str, source_file: Option<&str>) -> Vec<u8> {
    let mut pool: Vec<Vec<u8>> = Vec::new();
    let push = |pool: &mut Vec<Vec<u8>>, tag: u8, body: &[u8]| -> u16 {
        pool.push([&[tag][..], body].concat());
        pool.len() as u16
    };
    let utf8 = |pool: &mut Vec<Vec<u8>>, s: &[u8]| -> u16 {
        let body = [&(s.len() as u16).to_be_bytes()[..], s].concat();
        push(pool, 1, &body)
    };
    let class = |pool: &mut Vec<Vec<u8>>, s: &[u8]| -> u16 {
        let name_index = utf8(pool, s);
        push(pool, 7, &name_index.to_be_bytes())
    };

    let this_class = class(&mut pool, internal_name.as_bytes());
    let super_class = class(&mut pool, b"java/lang/Object");
    let runnable = class(&mut pool, b"java/lang/Runnable");
    let serializable = class(&mut pool, b"java/io/Serializable");

    let int_value = push(&mut pool, 3, &42i32.to_be_bytes());
    push(&mut pool, 4, &1.5f32.to_be_bytes());
    // Long and Double each take two slots.
    push(&mut pool, 5, &7i64.to_be_bytes());
    pool.push(Vec::new());
    push(&mut pool, 6, &2.5f64.to_be_bytes());
    pool.push(Vec::new());
    let text = utf8(&mut pool, b"hello");
    push(&mut pool, 8, &text.to_be_bytes());
    let method_name = utf8(&mut pool, b"run");
    let descriptor = utf8(&mut pool, b"()V");
    let name_and_type = [method_name, descriptor].map(u16::to_be_bytes).concat();
    let name_and_type = push(&mut pool, 12, &name_and_type);
    let member_ref = [super_class, name_and_type].map(u16::to_be_bytes).concat();
    push(&mut pool, 9, &member_ref);
    let method_ref = push(&mut pool, 10, &member_ref);
    push(&mut pool, 11, &member_ref);
    push(&mut pool, 15, &[&[6u8][..], &method_ref.to_be_bytes()].concat());
    push(&mut pool, 16, &descriptor.to_be_bytes());
    push(&mut pool, 17, &[0u16, name_and_type].map(u16::to_be_bytes).concat());
    push(&mut pool, 18, &[0u16, name_and_type].map(u16::to_be_bytes).concat());
    let module = utf8(&mut pool, b"example.module");
    push(&mut pool, 19, &module.to_be_bytes());
    let package = utf8(&mut pool, b"com/example");
    push(&mut pool, 20, &package.to_be_bytes());

    let field_name = utf8(&mut pool, b"ANSWER");
    let field_descriptor = utf8(&mut pool, b"I");
    let constant_value = utf8(&mut pool, b"ConstantValue");
    let code = utf8(&mut pool, b"Code");
    let inner_classes = utf8(&mut pool, b"InnerClasses");
    let bootstrap_methods = utf8(&mut pool, b"BootstrapMethods");
    let source = source_file.map(|s| {
        let attr = utf8(&mut pool, b"SourceFile");
        let value = utf8(&mut pool, s.as_bytes());
        (attr, value)
    });

    let mut out = Vec::new();
    let u2 = |out: &mut Vec<u8>, values: &[u16]| {
        for value in values {
            out.extend_from_slice(&value.to_be_bytes());
        }
    };
    out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
    u2(&mut out, &[0, 61, pool.len() as u16 + 1]);
    for entry in &pool {
        out.extend_from_slice(entry);
    }
    u2(&mut out, &[0x0021, this_class, super_class]);
    u2(&mut out, &[2, runnable, serializable]);

    // public static final int ANSWER = 42
    u2(&mut out, &[1, 0x0019, field_name, field_descriptor, 1, constant_value]);
    out.extend_from_slice(&2u32.to_be_bytes());
    u2(&mut out, &[int_value]);

    u2(&mut out, &[1, 0x0001, method_name, descriptor, 1, code]);
    out.extend_from_slice(&5u32.to_be_bytes());
    out.extend_from_slice(&[0xFF, 0xFE, 0xFD, 0xFC, 0xB1]);

    let attributes_count = 2 + u16::from(source.is_some());
    u2(&mut out, &[attributes_count, inner_classes]);
    out.extend_from_slice(&10u32.to_be_bytes());
    u2(&mut out, &[1, runnable, 0, 0, 0x0009]);
    u2(&mut out, &[bootstrap_methods]);
    out.extend_from_slice(&6u32.to_be_bytes());
    u2(&mut out, &[1, method_ref, 0]);
    if let Some((attr, value)) = source {
        u2(&mut out, &[attr]);
        out.extend_from_slice(&2u32.to_be_bytes());
        u2(&mut out, &[value]);
    }
    out
}
