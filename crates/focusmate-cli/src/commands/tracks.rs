use focusmate_core::Catalog;
use serde::Serialize;

use super::CliResult;

#[derive(Serialize)]
struct Listing<'a> {
    focus: &'a [focusmate_core::Track],
    short_break: &'a [focusmate_core::Track],
    long_break: &'a [focusmate_core::Track],
}

pub fn run(json: bool) -> CliResult {
    let catalog = Catalog::builtin();

    if json {
        let listing = Listing {
            focus: catalog.focus,
            short_break: catalog.short_break,
            long_break: catalog.long_break,
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    print_list("Focus music (select with `start --music <n>` or `t <n>`):", catalog.focus);
    println!();
    print_list("Short break music (swap during a break with `t <n>`):", catalog.short_break);
    println!();
    print_list("Long break music (swap during a break with `t <n>`):", catalog.long_break);
    Ok(())
}

fn print_list(heading: &str, tracks: &[focusmate_core::Track]) {
    println!("{heading}");
    for (i, track) in tracks.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, track.name);
    }
}
