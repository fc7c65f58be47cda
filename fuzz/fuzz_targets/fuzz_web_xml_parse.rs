#![no_main]

use libfuzzer_sys::fuzz_target;

use war_archive::WarArchive;
use war_descriptor::{parse_web_xml, WebXmlDialect};

// Goal: never panic or hang on malformed descriptor bytes; a bad descriptor
// is a typed error, not a crash.
fuzz_target!(|data: &[u8]| {
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    std::fs::create_dir_all(dir.path().join("WEB-INF")).expect("failed to create WEB-INF");

    for dialect in [
        WebXmlDialect::GlassFish,
        WebXmlDialect::Sun,
        WebXmlDialect::WebLogic,
    ] {
        let path = dir.path().join(dialect.entry_name());
        std::fs::write(&path, data).expect("failed to write descriptor");
        let archive = WarArchive::new(dir.path());
        let _ = parse_web_xml(&archive, dialect);
        std::fs::remove_file(&path).expect("failed to remove descriptor");
    }
});
