use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn rex() -> Command {
    let mut cmd = Command::cargo_bin("rex").unwrap();
    // Make sure that the user's config file is not used.
    cmd.env("HOME", "");
    cmd
}

#[test]
fn cli_search_stdin() {
    for engine in ["nfa", "vm"] {
        rex()
            .arg("search")
            .arg("--engine")
            .arg(engine)
            .arg("a[bc]+d")
            .write_stdin("my abdomen")
            .assert()
            .success()
            .stdout("match 3..6\nomen\n");
    }
}

#[test]
fn cli_search_file() {
    let temp_dir = TempDir::new().unwrap();
    let input_file = temp_dir.child("input.txt");

    input_file.write_str("a cat is fat").unwrap();

    rex()
        .arg("search")
        .arg("rat|cat")
        .arg(input_file.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("match 2..5\n is fat"));
}

#[test]
fn cli_search_no_match() {
    rex()
        .arg("search")
        .arg("bababy")
        .write_stdin("aabababababish")
        .assert()
        .code(1)
        .stdout("no match\n");
}

#[test]
fn cli_search_no_leftover() {
    rex()
        .arg("search")
        .arg("--no-leftover")
        .arg("X")
        .write_stdin("wheXXXee")
        .assert()
        .success()
        .stdout("match 3..4\n");
}

#[test]
fn cli_search_max_chars() {
    rex()
        .arg("search")
        .arg("--max-chars")
        .arg("5")
        .arg("XXXY")
        .write_stdin("r u XXXY?")
        .assert()
        .code(1);

    rex()
        .arg("search")
        .arg("--max-chars")
        .arg("8")
        .arg("XXXY")
        .write_stdin("r u XXXY?")
        .assert()
        .success()
        .stdout("match 4..8\n?\n");
}

#[test]
fn cli_search_invalid_utf8() {
    rex()
        .arg("search")
        .arg("a")
        .write_stdin(vec![b'x', 0xFF, b'a'])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("can not read from standard input"));

    rex()
        .arg("search")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("must be valid UTF-8"));
}

#[test]
fn cli_search_invalid_pattern() {
    rex()
        .arg("search")
        .arg("a.b")
        .write_stdin("axb")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error: invalid pattern `a.b`"))
        .stderr(predicate::str::contains("at offset 1"));
}

#[test]
fn cli_search_unknown_engine() {
    rex()
        .arg("search")
        .arg("--engine")
        .arg("dfa")
        .arg("a")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown engine `dfa`"));
}

#[test]
fn cli_missing_file() {
    rex()
        .arg("search")
        .arg("a")
        .arg("does/not/exist.txt")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("can not read `does/not/exist.txt`"));
}

#[test]
fn cli_compile_and_exec() {
    let temp_dir = TempDir::new().unwrap();
    let program_file = temp_dir.child("program.rex");
    let input_file = temp_dir.child("input.txt");

    input_file
        .write_str("dogcatcatdogcatdogdogcatdogcatcatdogcatdogdogcatlikely")
        .unwrap();

    rex()
        .arg("compile")
        .arg("(cat|dog)+like")
        .arg("-o")
        .arg(program_file.path())
        .assert()
        .success();

    program_file.assert(predicate::path::exists());

    rex()
        .arg("exec")
        .arg(program_file.path())
        .arg(input_file.path())
        .assert()
        .success()
        .stdout("match 0..52\nly\n");

    rex()
        .arg("exec")
        .arg(program_file.path())
        .write_stdin("a hot dog")
        .assert()
        .code(1)
        .stdout("no match\n");
}

#[test]
fn cli_exec_invalid_program() {
    let temp_dir = TempDir::new().unwrap();
    let program_file = temp_dir.child("program.rex");

    program_file.write_str("not a program").unwrap();

    rex()
        .arg("exec")
        .arg(program_file.path())
        .write_stdin("abc")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("can not load program"));
}

#[test]
fn cli_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.child("rex.toml");

    config_file
        .write_str("[search]\nengine = \"nfa\"\nprint_leftover = false\n")
        .unwrap();

    rex()
        .arg("--config")
        .arg(config_file.path())
        .arg("search")
        .arg("hallo|a")
        .write_stdin("hallo")
        .assert()
        .success()
        .stdout("match 1..2\n");

    config_file.write_str("[search]\nfoo = 1\n").unwrap();

    rex()
        .arg("--config")
        .arg(config_file.path())
        .arg("search")
        .arg("a")
        .write_stdin("a")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid config file"));
}

#[test]
fn cli_debug_ast() {
    rex()
        .arg("debug")
        .arg("ast")
        .arg("ab|c")
        .assert()
        .success()
        .stdout(concat!(
            "either\n",
            "  chain\n",
            "    literal 'a'\n",
            "    literal 'b'\n",
            "  literal 'c'\n",
        ));
}

#[test]
fn cli_debug_code() {
    rex()
        .arg("debug")
        .arg("code")
        .arg("a*")
        .assert()
        .success()
        .stdout(concat!(
            "00000: SPLIT_A(0) 00011\n",
            "0000a: LIT 'a'\n",
            "0000b: JUMP 00000\n",
            "00011: MATCH\n",
        ));
}
