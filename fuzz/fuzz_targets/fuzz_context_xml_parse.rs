#![no_main]

use libfuzzer_sys::fuzz_target;

use war_descriptor::parse_context_xml;

// Goal: never panic or hang on malformed context.xml bytes.
fuzz_target!(|data: &[u8]| {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let path = dir.path().join("context.xml");
    std::fs::write(&path, data).expect("failed to write context.xml");
    let _ = parse_context_xml(&path);
});
