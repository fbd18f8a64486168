//! Strategy engine: turns a generation request into the prompt pair sent to the model.
//!
//! Each prompt states the task, the output contract the normalizer relies on, any
//! per-placeholder extra instructions, and the user's context.

use crate::prompts::{
    BulletParams, GenerationDescriptor, SelectionParams, StepParams, Strategy, TableParams, TextParams,
};
use crate::template::Markup;

/// Everything needed to prompt for one placeholder.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub placeholder: &'a str,
    pub descriptor: &'a GenerationDescriptor,
    pub user_context: &'a str,
    pub system_prompt: &'a str,
    pub markup: Markup,
}

/// The (system, user) message pair for one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

pub fn build_prompt(request: &GenerationRequest<'_>) -> PromptPair {
    let (task, rules) = match &request.descriptor.strategy {
        Strategy::Header(params) => header_instructions(params),
        Strategy::Sentence(params) => sentence_instructions(params),
        Strategy::Bullets(params) => bullet_instructions(params),
        Strategy::Numbered(params) => numbered_instructions(params),
        Strategy::Selection(params) => selection_instructions(params),
        Strategy::Table(params) => table_instructions(params, request.descriptor),
    };

    let mut user = String::new();
    user.push_str(&task);
    user.push_str("\n\nRules:\n");
    for rule in &rules {
        user.push_str("- ");
        user.push_str(rule);
        user.push('\n');
    }
    if let Some(extra) = &request.descriptor.extra_instructions {
        user.push_str("\nAdditional instructions (these take precedence over the rules above):\n");
        user.push_str(extra.trim());
        user.push('\n');
    }
    user.push_str(&format!(
        "\nThis text fills the '{}' field of a {} document.\n",
        request.placeholder,
        markup_name(request.markup)
    ));
    user.push_str("\nContext:\n");
    user.push_str(request.user_context.trim());
    user.push('\n');

    PromptPair {
        system: request.system_prompt.to_string(),
        user,
    }
}

fn markup_name(markup: Markup) -> &'static str {
    match markup {
        Markup::Jira => "Jira",
        Markup::Markdown => "Markdown",
        Markup::AsciiDoc => "AsciiDoc",
    }
}

fn header_instructions(params: &TextParams) -> (String, Vec<String>) {
    (
        "Write a brief, concise title.".to_string(),
        vec![
            format!("Use at most {} words.", params.word_limit),
            "Do not end with punctuation and do not wrap the title in quotes.".to_string(),
            "Return only the title, with no preamble, label or commentary.".to_string(),
        ],
    )
}

fn sentence_length(word_limit: usize) -> &'static str {
    if word_limit <= 20 {
        "exactly one sentence"
    } else if word_limit <= 60 {
        "one to three sentences"
    } else {
        "a short paragraph"
    }
}

fn sentence_instructions(params: &TextParams) -> (String, Vec<String>) {
    (
        "Write clear, descriptive prose about the topic.".to_string(),
        vec![
            format!(
                "Write {} with at most {} words in total.",
                sentence_length(params.word_limit),
                params.word_limit
            ),
            "Be functional and direct.".to_string(),
            "Do not use line breaks, headings or lists.".to_string(),
            "Return only the text, with no preamble, explanation or commentary.".to_string(),
        ],
    )
}

fn bullet_instructions(params: &BulletParams) -> (String, Vec<String>) {
    (
        "Write a list of points.".to_string(),
        vec![
            format!("Give at most {} items.", params.limit),
            "Put exactly one idea per item and one item per line.".to_string(),
            "Do not number the items and do not add bullet characters.".to_string(),
            "Return only the list, with no preamble, heading or commentary.".to_string(),
        ],
    )
}

fn numbered_instructions(params: &StepParams) -> (String, Vec<String>) {
    (
        "Write a list of sequential steps.".to_string(),
        vec![
            format!("Give at most {} steps, in order.", params.limit),
            "Each step is clear and actionable and sits on its own line.".to_string(),
            "Do not number the steps and do not add bullet characters.".to_string(),
            "Return only the steps, with no preamble, heading or commentary.".to_string(),
        ],
    )
}

fn selection_instructions(params: &SelectionParams) -> (String, Vec<String>) {
    let options = params
        .options
        .iter()
        .map(|option| format!("'{}'", option))
        .collect::<Vec<_>>()
        .join(", ");
    let count = if params.max_selections == 1 {
        "Select exactly ONE option".to_string()
    } else {
        format!("Select between one and {} options", params.max_selections)
    };
    (
        format!(
            "{} from the list that best matches the context.\n\nAvailable options: {}",
            count, options
        ),
        vec![
            "Copy each chosen option verbatim from the list; do not paraphrase it.".to_string(),
            "Never invent an option that is not in the list.".to_string(),
            "Put each chosen option on its own line.".to_string(),
            "Return only the chosen option(s), with no explanation or commentary.".to_string(),
        ],
    )
}

fn table_instructions(
    params: &TableParams,
    descriptor: &GenerationDescriptor,
) -> (String, Vec<String>) {
    let headers = params.headers.join(" | ");
    let mut rules = vec![
        format!("Create at most {} table(s).", params.table_limit),
        match &params.title_pattern {
            Some(pattern) => format!(
                "Put a title line before each table, following the pattern '{}': replace the abbreviation and <n> with a sequence number starting at 1, and <title> with a short, action-based title.",
                pattern
            ),
            None => "Put a short, action-based title line before each table.".to_string(),
        },
        format!(
            "Each table has exactly {} columns: {}. Do not repeat the header row.",
            params.headers.len(),
            headers
        ),
        format!(
            "Write every row on one line as '| {} |', with exactly {} cells.",
            params
                .headers
                .iter()
                .map(|_| "cell")
                .collect::<Vec<_>>()
                .join(" | "),
            params.headers.len()
        ),
    ];
    if descriptor
        .extra_instructions
        .as_deref()
        .map(describes_flow)
        .unwrap_or(false)
    {
        rules.push(
            "Alternate rows between an actor action and the system response.".to_string(),
        );
    }
    rules.push(
        "Return only the titles and table rows, with no code fences, preamble or commentary."
            .to_string(),
    );
    ("Create one or more tables based on the context.".to_string(), rules)
}

fn describes_flow(extra: &str) -> bool {
    let lower = extra.to_lowercase();
    ["flow", "actor", "system response", "scenario"]
        .iter()
        .any(|hint| lower.contains(hint))
}
