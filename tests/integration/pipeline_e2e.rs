//! End-to-end pipeline tests over the bundled story template with a scripted client.

use super::test_utils::{bundled_prompts, bundled_templates_dir, prompts_without, FieldClient};
use issuegen::cli::write_document;
use issuegen::error::{FailureReason, GenerationError};
use issuegen::generation::{CancelFlag, GenerationOptions, Generator, ResultStatus};
use issuegen::template::{extract_placeholders, DocumentType, TemplateCatalog};
use tempfile::TempDir;

const CONTEXT: &str = "Returning customers should be able to sign in with their email address \
                       and a password instead of the legacy username.";

fn options() -> GenerationOptions {
    GenerationOptions {
        model: "gemma3:27b".to_string(),
        markup: None,
        empty_response_retries: 1,
    }
}

#[tokio::test]
async fn test_story_with_all_descriptors_has_no_sentinels() {
    let prompts = bundled_prompts();
    let template = TemplateCatalog::new(bundled_templates_dir())
        .load(DocumentType::Story)
        .unwrap();
    let client = FieldClient::new(bundled_prompts());

    let report = Generator::new(&prompts, &client, options())
        .generate(CONTEXT, &template, &CancelFlag::new())
        .await
        .unwrap();

    assert!(report.is_complete(), "failed: {:?}", report.failed());
    assert_eq!(report.results.len(), template.placeholders.len());
    assert_eq!(client.calls(), template.placeholders);

    let text = &report.document.text;
    assert!(!text.contains("[[MISSING"));
    assert!(extract_placeholders(text, template.markup).is_empty());
    assert!(text.starts_with("h1. Email login title\n"));
    assert!(text.contains("|Highest|"));
    assert!(text.contains("* acceptance_criteria first point\n* acceptance_criteria second point"));
    assert!(text.contains("# Open the implementation_steps page\n# Enter the details"));
    assert!(!text.contains("Here is the list"));
    assert!(text.contains("* Code reviewed and merged"));
}

#[tokio::test]
async fn test_transport_error_on_third_call_aborts_without_output() {
    let prompts = bundled_prompts();
    let template = TemplateCatalog::new(bundled_templates_dir())
        .load(DocumentType::Story)
        .unwrap();
    let client = FieldClient::new(bundled_prompts()).failing_on(3);
    let temp = TempDir::new().unwrap();
    let output_dir = temp.path().join("output");

    let outcome = Generator::new(&prompts, &client, options())
        .generate(CONTEXT, &template, &CancelFlag::new())
        .await;
    if let Ok(report) = &outcome {
        write_document(&output_dir, "story.md", &report.document.text).unwrap();
    }

    assert!(matches!(outcome, Err(GenerationError::Transport(_))));
    assert_eq!(client.calls().len(), 3, "no calls after the failing one");
    assert!(!output_dir.exists());
}

#[tokio::test]
async fn test_missing_descriptor_leaves_sentinel_only_there() {
    let template = TemplateCatalog::new(bundled_templates_dir())
        .load(DocumentType::Story)
        .unwrap();

    let full_prompts = bundled_prompts();
    let full_client = FieldClient::new(bundled_prompts());
    let full = Generator::new(&full_prompts, &full_client, options())
        .generate(CONTEXT, &template, &CancelFlag::new())
        .await
        .unwrap();

    let partial_prompts = prompts_without("acceptance_criteria");
    let partial_client = FieldClient::new(bundled_prompts());
    let partial = Generator::new(&partial_prompts, &partial_client, options())
        .generate(CONTEXT, &template, &CancelFlag::new())
        .await
        .unwrap();

    let failed = partial.failed();
    assert_eq!(
        failed,
        vec![("acceptance_criteria", &FailureReason::UnknownPlaceholder)]
    );
    assert!(!partial_client.calls().contains(&"acceptance_criteria".to_string()));

    let original_value = full
        .results
        .iter()
        .find(|r| r.placeholder == "acceptance_criteria")
        .map(|r| r.value.clone())
        .unwrap();
    assert_eq!(
        partial.document.text,
        full.document
            .text
            .replace(&original_value, "[[MISSING: acceptance_criteria]]")
    );
    assert_eq!(partial.document.text.matches("[[MISSING:").count(), 1);
}

#[tokio::test]
async fn test_results_follow_template_order() {
    let prompts = bundled_prompts();
    let template = TemplateCatalog::new(bundled_templates_dir())
        .load(DocumentType::Epic)
        .unwrap();
    let client = FieldClient::new(bundled_prompts());

    let report = Generator::new(&prompts, &client, options())
        .generate(CONTEXT, &template, &CancelFlag::new())
        .await
        .unwrap();

    let order: Vec<&str> = report.results.iter().map(|r| r.placeholder.as_str()).collect();
    assert_eq!(order, template.placeholders.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(report
        .results
        .iter()
        .all(|r| r.status == ResultStatus::Ok));
}
