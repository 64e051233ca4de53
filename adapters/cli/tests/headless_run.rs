use std::process::Command;

fn ascent(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ascent"))
        .args(args)
        .output()
        .expect("failed to run ascent binary")
}

#[test]
fn builtin_catalog_run_prints_chunks_and_totals() {
    let output = ascent(&["--height", "60", "--speed", "30", "--frame-ms", "100"]);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.contains("part `warm-up` from y=0.0"), "{stdout}");
    assert!(stdout.lines().any(|line| line.starts_with("chunk")));
    assert!(stdout.contains("camera 60.0"));
    assert!(stdout.contains("platforms spawned"));
}

#[test]
fn identical_seeds_print_identical_runs() {
    let args = ["--height", "80", "--seed", "7", "--frame-ms", "50"];
    let first = ascent(&args);
    let second = ascent(&args);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn missing_catalog_fails_with_context() {
    let output = ascent(&["--catalog", "/nonexistent/catalog.toml"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr).expect("utf-8 output");
    assert!(stderr.contains("failed to load catalog"), "{stderr}");
}
