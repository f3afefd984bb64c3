use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

use lantern_runtime::PackBuilder;

fn build_pack(stage: &str) -> NamedTempFile {
    let bytes = PackBuilder::new()
        .stage_xml(stage)
        .file("models/env.glb", b"glTF-binary-blob")
        .build();
    let mut tmp = NamedTempFile::new().expect("temp pack");
    tmp.write_all(&bytes).expect("write pack");
    tmp
}

fn courtyard_stage(spawn: &str, spark_ticks: u32) -> String {
    format!(
        r#"<stage>
  <spawn>{spawn}</spawn>
  <spark>{spark_ticks}</spark>
  <model>
    <name>environment</name>
    <file>models/env.glb</file>
  </model>
  <surface>
    <name>courtyard</name>
    <kind>collision</kind>
    <min>-50 -1 -50</min>
    <max>50 0 50</max>
  </surface>
  <lantern><position>0 0 0</position></lantern>
  <lantern><position>0 0 3</position></lantern>
</stage>
"#
    )
}

#[test]
fn cli_walks_the_stage_and_lights_the_lanterns() {
    let pack = build_pack(&courtyard_stage("0 0.1 0", 120));
    let mut cmd = Command::cargo_bin("lantern-runtime").expect("binary exists");
    cmd.arg(pack.path()).arg("--ticks").arg("90").arg("--walk");
    cmd.assert()
        .success()
        .stdout(contains("Loaded stage with 1 surfaces (2 lanterns)"))
        .stdout(contains(" - environment (models/env.glb)"))
        .stdout(contains(" - phase GAME"))
        .stdout(contains(" - lanterns lit 2/2"));
}

#[test]
fn cli_idle_run_burns_out_and_loses() {
    // Spawned away from every lantern; nothing refreshes the spark.
    let pack = build_pack(&courtyard_stage("10 0.1 10", 120));
    let mut cmd = Command::cargo_bin("lantern-runtime").expect("binary exists");
    cmd.arg(pack.path()).arg("--ticks").arg("300");
    cmd.assert()
        .success()
        .stdout(contains("Spark burned out after"))
        .stdout(contains(" - phase LOSE"));
}

#[test]
fn cli_rejects_a_missing_pack_argument() {
    let mut cmd = Command::cargo_bin("lantern-runtime").expect("binary exists");
    cmd.assert().failure().stderr(contains("Usage"));
}

#[test]
fn cli_rejects_a_pack_with_missing_models() {
    let stage = r#"<stage>
  <model>
    <name>environment</name>
    <file>models/absent.glb</file>
  </model>
</stage>
"#;
    let pack = build_pack(stage);
    let mut cmd = Command::cargo_bin("lantern-runtime").expect("binary exists");
    cmd.arg(pack.path()).arg("--ticks").arg("10");
    cmd.assert()
        .failure()
        .stderr(contains("failed to load gameplay assets"));
}
