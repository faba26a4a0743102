#![no_main]

use libfuzzer_sys::fuzz_target;
use pdfpress::io::DocumentHandle;
use pdfpress::validation::Validator;
use std::sync::OnceLock;
use tokio::runtime::{Builder, Runtime};

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| Builder::new_current_thread().enable_all().build().unwrap())
}

fuzz_target!(|data: &[u8]| {
    let handle = DocumentHandle::from_bytes("fuzz.pdf", data.to_vec());
    let result = runtime().block_on(Validator::new().validate(&handle));

    // Every input is classified; invalid ones always explain why
    if result.is_valid() {
        assert!(result.page_count >= 1);
    } else {
        assert!(result.code.is_some());
        assert!(!result.message.is_empty());
    }
});
