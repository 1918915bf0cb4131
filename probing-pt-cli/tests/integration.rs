use assert_cmd::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use probing_pt_store::{Candidate, StoreWriter};
use tempfile::TempDir;

/// `probing-pt` with color off and no store from the environment.
fn probing_pt() -> Command {
    let mut cmd = cargo_bin_cmd!("probing-pt");
    cmd.env("NO_COLOR", "1");
    cmd.env_remove("PROBING_PT_STORE");
    cmd
}

fn candidate(target: &[u32], scores: &[f32], alignment: &[u8]) -> Candidate {
    Candidate {
        target_phrase: target.to_vec(),
        scores: scores.to_vec(),
        lex_scores: Vec::new(),
        alignment: alignment.to_vec(),
    }
}

/// Two phrases: `das haus` (ids 1 2) with two candidates and `klein` (id 3).
fn sample_store() -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut writer = StoreWriter::new(2, 0, true);
    writer
        .add_phrase(
            &[1, 2],
            vec![
                candidate(&[10, 11], &[-0.5, -1.0], &[0, 0, 1, 1]),
                candidate(&[12], &[-2.0, -3.0], &[]),
            ],
        )
        .unwrap();
    writer
        .add_phrase(&[3], vec![candidate(&[13], &[-0.25, -0.75], &[0, 0])])
        .unwrap();
    writer.finish(dir.path()).unwrap();

    std::fs::write(dir.path().join("source_vocabids"), "1\tdas\n2\thaus\n3\tklein\n").unwrap();
    std::fs::write(
        dir.path().join("target_vocabids"),
        "10\tthe\n11\thouse\n12\thome\n13\tsmall\n",
    )
    .unwrap();
    dir
}

fn store_arg(dir: &TempDir) -> String {
    dir.path().display().to_string()
}

// ============================================================================
// Argument handling
// ============================================================================

#[test]
fn version_flag() {
    probing_pt()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("probing-pt"));
}

#[test]
fn help_lists_commands() {
    probing_pt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("query"))
        .stdout(predicate::str::contains("dump"))
        .stdout(predicate::str::contains("verify"));
}

#[test]
fn verbose_quiet_conflict() {
    probing_pt()
        .args(["--verbose", "--quiet", "info", "/nonexistent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn query_needs_a_phrase() {
    let store = sample_store();
    probing_pt()
        .args(["query", &store_arg(&store)])
        .assert()
        .failure();
}

#[test]
fn query_accepts_only_one_phrase_form() {
    let store = sample_store();
    probing_pt()
        .args(["query", &store_arg(&store), "--ids", "1", "--key", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

// ============================================================================
// info
// ============================================================================

#[test]
fn info_table() {
    let store = sample_store();
    probing_pt()
        .args(["info", &store_arg(&store)])
        .assert()
        .success()
        .stdout(predicate::str::contains("api version"))
        .stdout(predicate::str::contains("15"))
        .stdout(predicate::str::contains("entries"));
}

#[test]
fn info_json() {
    let store = sample_store();
    let out = probing_pt()
        .args(["info", &store_arg(&store), "--format", "json"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["entries"], 2);
    assert_eq!(json["buckets"], 3);
    assert_eq!(json["config"]["num_scores"], 2);
    assert_eq!(json["source_vocab"], true);
}

#[test]
fn store_path_from_env() {
    let store = sample_store();
    probing_pt()
        .env("PROBING_PT_STORE", store.path())
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("entries"));
}

// ============================================================================
// query
// ============================================================================

#[test]
fn query_by_ids_renders_target_words() {
    let store = sample_store();
    probing_pt()
        .args(["query", &store_arg(&store), "--ids", "1", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 candidate(s)"))
        .stdout(predicate::str::contains("the house"))
        .stdout(predicate::str::contains("0-0 1-1"))
        .stdout(predicate::str::contains("home"));
}

#[test]
fn query_by_words_and_key_agree() {
    let store = sample_store();
    let by_words = probing_pt()
        .args(["query", &store_arg(&store), "--words", "das haus"])
        .output()
        .unwrap();
    // key of [1, 2] is 1 + (2 << 1)
    let by_key = probing_pt()
        .args(["query", &store_arg(&store), "--key", "5"])
        .output()
        .unwrap();
    assert!(by_words.status.success());
    assert_eq!(by_words.stdout, by_key.stdout);
}

#[test]
fn query_missing_phrase_is_not_an_error() {
    let store = sample_store();
    probing_pt()
        .args(["query", &store_arg(&store), "--ids", "2,1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn query_json() {
    let store = sample_store();
    let out = probing_pt()
        .args(["query", &store_arg(&store), "--words", "klein", "--format", "json"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["found"], true);
    assert_eq!(json["key"], 3);
    assert_eq!(json["candidates"][0]["target_phrase"], serde_json::json!([13]));
    assert_eq!(json["candidates"][0]["scores"], serde_json::json!([-0.25, -0.75]));
}

#[test]
fn query_unknown_word_fails() {
    let store = sample_store();
    probing_pt()
        .args(["query", &store_arg(&store), "--words", "das boot"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown source token 'boot'"));
}

// ============================================================================
// dump / verify
// ============================================================================

#[test]
fn dump_prints_every_key() {
    let store = sample_store();
    let out = probing_pt()
        .args(["dump", &store_arg(&store)])
        .output()
        .unwrap();
    assert!(out.status.success());

    let text = String::from_utf8(out.stdout).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("key ")).count(), 2);
    assert!(text.contains("Entry 2 of 2:\nhome\t-2 -3 \t\n"));
    assert!(text.contains("Entry 1 of 1:\nsmall\t-0.25 -0.75 \t0-0\n"));
}

#[test]
fn dump_respects_limit() {
    let store = sample_store();
    let out = probing_pt()
        .args(["dump", &store_arg(&store), "--limit", "1"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let text = String::from_utf8(out.stdout).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("key ")).count(), 1);
}

#[test]
fn verify_ok() {
    let store = sample_store();
    probing_pt()
        .args(["verify", &store_arg(&store)])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: 2 keys, 3 candidates"));
}

#[test]
fn verify_reports_corrupt_payload() {
    let store = sample_store();
    let payload = store.path().join("binfile.dat");
    let len = std::fs::metadata(&payload).unwrap().len() as usize;
    std::fs::write(&payload, vec![0xFF; len]).unwrap();

    probing_pt()
        .args(["verify", &store_arg(&store)])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("error:"));
}

// ============================================================================
// Open failures
// ============================================================================

#[test]
fn version_mismatch_suggests_rebuild() {
    let store = sample_store();
    let config = store.path().join("config");
    let text = std::fs::read_to_string(&config).unwrap();
    let (_, rest) = text.split_once('\n').unwrap();
    std::fs::write(&config, format!("14\n{rest}")).unwrap();

    probing_pt()
        .args(["info", &store_arg(&store)])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("rebuild the phrase table"));
}

#[test]
fn missing_store_fails() {
    let tmp = TempDir::new().unwrap();
    probing_pt()
        .args(["verify", &tmp.path().join("nope").display().to_string()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn oversized_config_is_an_error_not_a_crash() {
    let store = sample_store();
    std::fs::write(
        store.path().join("config"),
        format!("15\n{}\n2\n0\n1\n", u64::MAX),
    )
    .unwrap();

    probing_pt()
        .args(["info", &store_arg(&store)])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid config"));
}

// ============================================================================
// Logging
// ============================================================================

#[test]
fn rust_log_alone_keeps_stderr_quiet() {
    let store = sample_store();
    probing_pt()
        .env("RUST_LOG", "info")
        .args(["verify", &store_arg(&store)])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn verbose_logs_to_stderr() {
    let store = sample_store();
    probing_pt()
        .env_remove("RUST_LOG")
        .args(["--verbose", "verify", &store_arg(&store)])
        .assert()
        .success()
        .stderr(predicate::str::contains("opened phrase table"));
}
