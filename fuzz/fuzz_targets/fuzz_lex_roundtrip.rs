#![no_main]

use libfuzzer_sys::fuzz_target;

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };

    let (tokens, _errors) = ferry_syntax::lex_with_errors(text);
    let rendered: String = tokens.iter().map(|t| t.text()).collect();
    assert_eq!(rendered, text, "lexing must be lossless");
    assert!(tokens.iter().all(|t| !t.text().is_empty()));
});
