#![no_main]

use std::sync::OnceLock;

use ferry_core::FileId;
use ferry_migrate::{ConstructorInjector, MageCallMatcher, MageProcessor, ProcessOutcome};
use ferry_syntax::TokenStream;
use libfuzzer_sys::fuzz_target;

mod utils;

fn processor() -> &'static MageProcessor {
    static PROCESSOR: OnceLock<MageProcessor> = OnceLock::new();
    PROCESSOR.get_or_init(|| {
        MageProcessor::new(
            MageCallMatcher::default(),
            Box::new(ConstructorInjector::default()),
        )
    })
}

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };

    let file = FileId::new("Fuzz.php");
    let input = TokenStream::from_source(text);
    let balanced = input.is_balanced();

    // Errors are fine (malformed constructors); panics are not.
    let Ok(outcome) = processor().process(&file, input) else {
        return;
    };
    match &outcome {
        ProcessOutcome::Skipped { tokens } => assert_eq!(tokens.render(), text),
        ProcessOutcome::Converted { tokens, .. } => {
            let rendered = tokens.render();
            assert_eq!(TokenStream::from_source(&rendered).render(), rendered);
            if balanced {
                assert!(tokens.is_balanced(), "rewrite unbalanced the file");
            }
        }
    }
});
