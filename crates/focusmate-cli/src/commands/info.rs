use super::CliResult;

const INTRO: &str = "\
A simple rhythm of deep work and intentional rest. Twenty-five minutes of
focus, followed by a short reset, repeated to build momentum without
burning out.

Developed in the late 1980s, the Pomodoro Technique uses a timer to
structure your day into focused work intervals separated by restorative
breaks. The name comes from the tomato-shaped kitchen timer used by its
creator.

Each 25-minute block is a commitment: choose one task, remove
distractions, and give it your full attention until the timer rings. Then
take a short pause to breathe, move, or hydrate before diving into the
next session.";

const BENEFITS: [(&str, &str); 4] = [
    (
        "Improved focus",
        "short sprints help you defend your attention and reach deep work faster.",
    ),
    (
        "Less burnout",
        "scheduled breaks keep your energy steady and your mind refreshed.",
    ),
    (
        "Time awareness",
        "tracking sessions builds a sharp sense of how long tasks really take.",
    ),
    (
        "Built-in motivation",
        "every completed Pomodoro is a small win that keeps momentum going.",
    ),
];

pub fn run() -> CliResult {
    println!("What is the Pomodoro Technique?");
    println!();
    println!("{INTRO}");
    println!();
    println!("Key benefits");
    for (title, text) in BENEFITS {
        println!("  * {title}: {text}");
    }
    println!();
    println!("FocusMate - work with intention");
    Ok(())
}
