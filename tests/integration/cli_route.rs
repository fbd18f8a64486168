//! Route-level tests: settings, bundled templates and a fake provider wired together.

use super::test_utils::{
    bundled_prompts, bundled_templates_dir, canned_answer, chat_response, FakeProvider,
};
use issuegen::cli::{Cli, Commands, RunContext, EXIT_CHECK_FAILED, EXIT_SUCCESS};
use issuegen::config::Settings;
use issuegen::error::GenerationError;
use issuegen::provider::ProviderKind;
use clap::Parser;
use std::path::Path;
use tempfile::TempDir;

/// Fake provider answering every field with its canned answer; fails with 503 on `fail_at` (0-based).
fn field_server(fail_at: Option<usize>) -> FakeProvider {
    let prompts = bundled_prompts();
    FakeProvider::start(move |index, request| {
        if Some(index) == fail_at {
            return (503, r#"{"error":"overloaded"}"#.to_string());
        }
        let field = request.field().unwrap_or_default();
        match prompts.descriptor(&field) {
            Some(descriptor) => (200, chat_response(&canned_answer(&field, descriptor))),
            None => (200, chat_response("")),
        }
    })
}

fn settings(workspace: &Path, base_url: &str) -> Settings {
    let mut settings = Settings::default();
    settings.provider.kind = ProviderKind::Ollama;
    settings.provider.base_url = base_url.to_string();
    settings.provider.timeout_secs = 5;
    settings.paths.templates_dir = bundled_templates_dir();
    settings.paths.prompts_file = bundled_templates_dir().join("prompts.json");
    settings.paths.output_dir = workspace.join("output");
    settings
}

fn command(args: &[&str]) -> Commands {
    let mut argv = vec!["issuegen"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
}

#[test]
fn test_generate_writes_document_to_output_dir() {
    let temp = TempDir::new().unwrap();
    let server = field_server(None);
    let ctx = RunContext::with_settings(settings(temp.path(), &server.base_url), temp.path().to_path_buf())
        .with_progress(false);

    let output = ctx
        .execute(&command(&["generate", "Email sign-in", "--output", "login.md"]))
        .unwrap();

    assert_eq!(output.exit_code, EXIT_SUCCESS);
    let written = temp.path().join("output").join("login.md");
    assert!(output.stdout.contains("written to"));
    let text = std::fs::read_to_string(&written).unwrap();
    assert!(text.starts_with("h1. Email login title"));
    assert!(!text.contains("[[MISSING"));
    assert!(output.stderr.contains("Story generated"));
    assert!(output.stderr.contains("started "));

    let paths: Vec<String> = server.requests().iter().map(|r| r.path.clone()).collect();
    assert!(paths.iter().all(|p| p == "/v1/chat/completions"));
}

#[test]
fn test_generate_prints_to_stdout_without_output_name() {
    let temp = TempDir::new().unwrap();
    let server = field_server(None);
    let ctx = RunContext::with_settings(settings(temp.path(), &server.base_url), temp.path().to_path_buf())
        .with_progress(false);

    let output = ctx
        .execute(&command(&["generate", "Password reset", "--type", "use-case", "--model", "llama3"]))
        .unwrap();
    assert!(output.stdout.starts_with("= Use Case: Email login title"));
    assert!(!temp.path().join("output").exists());
    assert!(server.requests().iter().all(|r| r.json()["model"] == "llama3"));
}

#[test]
fn test_transport_failure_on_third_call_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let server = field_server(Some(2));
    let ctx = RunContext::with_settings(settings(temp.path(), &server.base_url), temp.path().to_path_buf())
        .with_progress(false);

    let err = ctx
        .execute(&command(&["generate", "Email sign-in", "--output", "login.md"]))
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<GenerationError>(),
        Some(GenerationError::Transport(_))
    ));
    assert_eq!(server.requests().len(), 3);
    assert!(!temp.path().join("output").exists());
}

#[test]
fn test_context_file_and_markup_override() {
    let temp = TempDir::new().unwrap();
    let server = field_server(None);
    let context_file = temp.path().join("context.txt");
    std::fs::write(&context_file, "Customers export invoices as PDF\n").unwrap();
    let ctx = RunContext::with_settings(settings(temp.path(), &server.base_url), temp.path().to_path_buf())
        .with_progress(false);

    let output = ctx
        .execute(&command(&[
            "generate",
            "--context-file",
            context_file.to_str().unwrap(),
            "--markup",
            "markdown",
        ]))
        .unwrap();

    assert!(output.stdout.contains("- acceptance_criteria first point"));
    assert!(output.stdout.contains("1. Open the implementation_steps page"));
    let first = &server.requests()[0];
    let user = first.json()["messages"][1]["content"].as_str().unwrap().to_string();
    assert!(user.contains("Customers export invoices as PDF"));
    assert!(user.contains("Markdown document"));
}

#[test]
fn test_missing_template_is_fatal() {
    let temp = TempDir::new().unwrap();
    let mut settings = settings(temp.path(), "http://127.0.0.1:9");
    settings.paths.templates_dir = temp.path().join("no-templates");
    let ctx = RunContext::with_settings(settings, temp.path().to_path_buf()).with_progress(false);

    let err = ctx.execute(&command(&["generate", "ctx"])).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GenerationError>(),
        Some(GenerationError::TemplateNotFound { .. })
    ));
}

#[test]
fn test_check_passes_on_bundled_templates() {
    let temp = TempDir::new().unwrap();
    let ctx = RunContext::with_settings(settings(temp.path(), "http://127.0.0.1:9"), temp.path().to_path_buf());
    let output = ctx.execute(&Commands::Check).unwrap();
    assert_eq!(output.exit_code, EXIT_SUCCESS, "{}", output.stdout);
    assert!(output.stdout.contains("All placeholders resolve."));
}

#[test]
fn test_check_reports_unresolved_placeholders() {
    let temp = TempDir::new().unwrap();
    let templates = temp.path().join("templates");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("story_template.md"), "h1. {{ title }}\n{{ owner }}\n").unwrap();
    std::fs::write(
        templates.join("prompts.json"),
        r#"{"system_prompt":"s","template_prompts":{"title":{"type":"header"}}}"#,
    )
    .unwrap();

    let mut settings = settings(temp.path(), "http://127.0.0.1:9");
    settings.paths.templates_dir = templates.clone();
    settings.paths.prompts_file = templates.join("prompts.json");
    let ctx = RunContext::with_settings(settings, temp.path().to_path_buf());

    let output = ctx.execute(&Commands::Check).unwrap();
    assert_eq!(output.exit_code, EXIT_CHECK_FAILED);
    assert!(output.stdout.contains("owner"));
}

#[test]
fn test_fields_lists_strategies() {
    let temp = TempDir::new().unwrap();
    let ctx = RunContext::with_settings(settings(temp.path(), "http://127.0.0.1:9"), temp.path().to_path_buf());

    let text = ctx.execute(&command(&["fields", "--type", "story"])).unwrap().stdout;
    assert!(text.contains("acceptance_criteria"));
    assert!(text.contains("bullets"));

    let json = ctx
        .execute(&command(&["fields", "--type", "use_case", "--format", "json"]))
        .unwrap()
        .stdout;
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["type"], "use-case");
    assert!(value["fields"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f["placeholder"] == "basic_flow"
            && f["strategy"]["type"] == "table"
            && f["strategy"]["args"]["table_headers"][0] == "Step"));
}

#[test]
fn test_models_lists_provider_models() {
    let temp = TempDir::new().unwrap();
    let server = FakeProvider::start(|_, _| {
        (200, r#"{"models":[{"name":"gemma3:27b"},{"name":"mistral"}]}"#.to_string())
    });
    let ctx = RunContext::with_settings(settings(temp.path(), &server.base_url), temp.path().to_path_buf());
    let output = ctx.execute(&Commands::Models).unwrap();
    assert!(output.stdout.contains("gemma3:27b"));
    assert!(output.stdout.contains("mistral"));
    assert!(output.stdout.contains("Total: 2 model(s)"));
}
