use serde_json::Value;

use crate::helpers::run_thumbforge;

#[test]
fn variations_prints_three_prompts_offline() {
    let output = run_thumbforge(&["variations", "--video-type", "Tech video"], &[]);

    assert!(
        output.status.success(),
        "variations should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let prompts: Value = serde_json::from_str(&stdout)
        .unwrap_or_else(|_| panic!("Should output valid JSON, got: {stdout}"));

    let prompts = prompts.as_array().expect("Should output an array");
    assert_eq!(prompts.len(), 3);
    assert!(
        prompts[0]
            .as_str()
            .unwrap()
            .starts_with("Photo uploaded for Tech video thumbnail. YouTube thumbnail for Tech video")
    );
    assert!(
        prompts[0]
            .as_str()
            .unwrap()
            .contains("vibrant colors, high contrast")
    );
}

#[test]
fn variations_are_deterministic() {
    let args = ["variations", "--style", "minimal", "--placement", "left"];
    let first = run_thumbforge(&args, &[]);
    let second = run_thumbforge(&args, &[]);

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert!(String::from_utf8_lossy(&first.stdout).contains("minimal style"));
}
