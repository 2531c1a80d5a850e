use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn exe() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rsid-genes"))
}

#[test]
fn help_lists_the_lookup_options() {
    let output = exe().arg("--help").output().expect("run rsid-genes cli");
    assert!(output.status.success(), "CLI exited with status {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--endpoint"));
    assert!(stdout.contains("--batch-size"));
}

#[test]
fn print_config_reflects_overrides() {
    let output = exe()
        .args(["--print-config", "--batch-size", "250", "--scopes", "dbsnp.rsid,clinvar.rsid"])
        .output()
        .expect("run rsid-genes cli");
    assert!(output.status.success(), "CLI exited with status {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("batch_size = 250"), "stdout: {stdout}");
    assert!(stdout.contains("scopes = \"dbsnp.rsid,clinvar.rsid\""), "stdout: {stdout}");
}

#[test]
fn flags_override_values_from_config_file() {
    let tmp = tempdir().expect("temporary directory");
    let config_path = tmp.path().join("lookup.toml");
    fs::write(
        &config_path,
        "endpoint = \"http://file.example/v1/query\"\n\
         scopes = \"dbsnp.rsid\"\n\
         batch_size = 100\n\
         timeout_secs = 30\n",
    )
    .expect("write config");

    let output = exe()
        .arg("--config")
        .arg(&config_path)
        .args([
            "--print-config",
            "--endpoint",
            "http://flag.example/v1/query",
            "--scopes",
            "clinvar.rsid",
            "--batch-size",
            "7",
        ])
        .output()
        .expect("run rsid-genes cli");
    assert!(output.status.success(), "CLI exited with status {:?}", output.status);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("endpoint = \"http://flag.example/v1/query\""), "stdout: {stdout}");
    assert!(stdout.contains("scopes = \"clinvar.rsid\""), "stdout: {stdout}");
    assert!(stdout.contains("batch_size = 7"), "stdout: {stdout}");
    // Keys not given on the command line keep the file's value.
    assert!(stdout.contains("timeout_secs = 30"), "stdout: {stdout}");
    assert!(!stdout.contains("file.example"), "stdout: {stdout}");
}

#[test]
fn invalid_batch_size_is_rejected() {
    let output = exe()
        .args(["--print-config", "--batch-size", "0"])
        .output()
        .expect("run rsid-genes cli");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Batch size"));
}

#[test]
fn input_without_label_column_fails_cleanly() {
    let tmp = tempdir().expect("temporary directory");
    let input = tmp.path().join("edges.csv");
    let output_path = tmp.path().join("genes.csv");
    fs::write(&input, "Source,Target,Type,Id\na,b,Undirected,0\n").expect("write input");

    let output = exe()
        // Unroutable: the run must fail before any request is made.
        .args(["--endpoint", "http://127.0.0.1:9/v1/query"])
        .arg(&input)
        .arg(&output_path)
        .output()
        .expect("run rsid-genes cli");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no 'Label' column"), "stderr: {stderr}");
    assert!(!output_path.exists());
}

#[test]
fn paths_are_prompted_for_when_omitted() {
    use std::io::Write;
    use std::process::Stdio;

    let tmp = tempdir().expect("temporary directory");
    let input = tmp.path().join("missing.csv");
    let output_path = tmp.path().join("genes.csv");

    let mut child = exe()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn rsid-genes cli");
    {
        let mut stdin = child.stdin.take().expect("stdin");
        writeln!(stdin, "{}", input.display()).expect("write input path");
        writeln!(stdin, "{}", output_path.display()).expect("write output path");
    }
    let output = child.wait_with_output().expect("wait for cli");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Enter the name of the input graph file: "));
    assert!(stdout.contains("Enter the desired name of the output graph file: "));
    // The prompted input path does not exist, so the run fails on opening it.
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("missing.csv"));
}
