//! Property-based tests for the C++ test harness
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use std::ffi::OsString;
use std::path::PathBuf;

use cxxtest::TestResult;
use cxxtest::process::ProcessOutput;
use cxxtest::report::render_junit;
use cxxtest::toolchain::{CompileRequest, HostFamily, Toolchain, build_command};
use proptest::prelude::*;

fn include_dir() -> impl Strategy<Value = PathBuf> {
    prop::sample::select(vec!["src", "src/fmt", "src/json", "include", "third_party"]).prop_map(PathBuf::from)
}

fn strings(command: &[OsString]) -> Vec<String> {
    command.iter().map(|arg| arg.to_string_lossy().into_owned()).collect()
}

// =============================================================================
// Compiler command properties
// =============================================================================

proptest! {
    /// Property: every include directory is passed exactly once, in first-seen order
    #[test]
    fn unix_includes_are_deduplicated(dirs in prop::collection::vec(include_dir(), 0..8)) {
        let toolchain = Toolchain::from_compiler(HostFamily::Unix, "clang++");
        let source = PathBuf::from("tests/test_a.cpp");
        let output = PathBuf::from("build/test_a");
        let default_include = PathBuf::from("src");
        let command = strings(&build_command(&toolchain, &CompileRequest {
            source: &source,
            output: &output,
            include_dirs: &dirs,
            default_include: &default_include,
            standard: "c++20",
        }));

        let passed: Vec<&str> = command
            .windows(2)
            .filter(|pair| pair[0] == "-I")
            .map(|pair| pair[1].as_str())
            .collect();

        let mut expected: Vec<String> = Vec::new();
        for dir in &dirs {
            let dir = dir.to_string_lossy().into_owned();
            if !expected.contains(&dir) {
                expected.push(dir);
            }
        }
        if expected.is_empty() {
            expected.push("src".to_string());
        }
        prop_assert_eq!(passed, expected.iter().map(String::as_str).collect::<Vec<_>>());

        prop_assert_eq!(command[0].as_str(), "clang++");
        prop_assert_eq!(command.iter().filter(|arg| *arg == "tests/test_a.cpp").count(), 1);
        prop_assert_eq!(&command[command.len() - 2..], &["-o".to_string(), "build/test_a".to_string()]);
    }

    /// Property: MSVC commands carry each include as a single `/I` argument and name the output last
    #[test]
    fn windows_command_shape(dirs in prop::collection::vec(include_dir(), 1..8)) {
        let toolchain = Toolchain::from_compiler(HostFamily::Windows, "cl");
        let source = PathBuf::from("tests/test_a.cpp");
        let output = PathBuf::from("build/test_a.exe");
        let default_include = PathBuf::from("src");
        let command = strings(&build_command(&toolchain, &CompileRequest {
            source: &source,
            output: &output,
            include_dirs: &dirs,
            default_include: &default_include,
            standard: "c++20",
        }));

        prop_assert_eq!(&command[..3], &["cl".to_string(), "/nologo".to_string(), "/std:c++20".to_string()]);
        prop_assert!(command.iter().filter(|arg| arg.starts_with("/I")).all(|arg| arg.len() > 2));
        prop_assert_eq!(command.last().map(String::as_str), Some("/Fe:build/test_a.exe"));
    }
}

// =============================================================================
// JUnit properties
// =============================================================================

fn result(name: String, run_code: i32, stderr: String) -> TestResult {
    TestResult {
        source: PathBuf::from(format!("tests/{name}.cpp")),
        executable: PathBuf::from(format!("build/{name}")),
        name,
        compiled: true,
        compile: ProcessOutput::new(0, "", ""),
        run: Some(ProcessOutput::new(run_code, "", stderr)),
    }
}

proptest! {
    /// Property: arbitrary captured output never leaks markup or XML-illegal characters
    #[test]
    fn junit_output_is_well_formed(
        cases in prop::collection::vec(("[a-z_]{1,12}", -3i32..3, any::<String>()), 0..6)
    ) {
        let results: Vec<TestResult> = cases
            .into_iter()
            .map(|(name, code, stderr)| result(format!("test_{name}"), code, stderr))
            .collect();
        let failures = results.iter().filter(|r| !r.passed()).count();

        let xml = render_junit(&results, "cpp-tests", "cpp");

        prop_assert_eq!(xml.matches("<testcase ").count(), results.len());
        prop_assert_eq!(xml.matches("<failure ").count(), failures);
        prop_assert_eq!(xml.matches("</failure>").count(), failures);
        let header = format!("tests=\"{}\" failures=\"{}\"", results.len(), failures);
        prop_assert!(xml.contains(&header));
        prop_assert!(
            xml.chars().all(|c| !(c < ' ' && !matches!(c, '\t' | '\n' | '\r'))),
            "control character in report"
        );
    }
}
