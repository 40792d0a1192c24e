use crate::infra::{build_engine, load_rules, InMemoryRuleSource, OutboxGateway};
use clap::Args;
use sarvam_setu::config::AppConfig;
use sarvam_setu::error::AppError;
use sarvam_setu::workflows::questionnaire::presentation::render_report;
use sarvam_setu::workflows::questionnaire::{
    AnswerValue, Answers, ChatEvent, EligibilityMatcher, EventId, EventOutcome, MatchReport,
    MessageId, OutboundAction, UserId,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Chat identity used for the scripted conversation.
    #[arg(long, default_value = "demo-user")]
    pub(crate) user: String,
    /// Rule catalog JSON. Defaults to RULES_PATH, then the bundled sample.
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
    /// Answer the age question with an invalid value first to show the re-prompt.
    #[arg(long)]
    pub(crate) show_validation: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct MatchArgs {
    #[arg(long)]
    pub(crate) state: Option<String>,
    /// Rural or Urban
    #[arg(long)]
    pub(crate) area: Option<String>,
    #[arg(long)]
    pub(crate) category: Option<String>,
    #[arg(long)]
    pub(crate) gender: Option<String>,
    #[arg(long)]
    pub(crate) occupation: Option<String>,
    #[arg(long)]
    pub(crate) age: Option<f64>,
    /// Holds a disability certificate
    #[arg(long)]
    pub(crate) disability: bool,
    /// Rule catalog JSON. Defaults to RULES_PATH, then the bundled sample.
    #[arg(long)]
    pub(crate) rules: Option<PathBuf>,
}

/// Scripted answers for the standard catalog: Karnataka, urban, OBC, female farmer, 25, no certificate.
const DEMO_SCRIPT: [(&str, bool); 7] = [
    ("Karnataka", false),
    ("Urban", false),
    ("OBC", false),
    ("Female", false),
    ("Farmer", false),
    ("25", true),
    ("No", false),
];

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        user,
        rules,
        show_validation,
    } = args;

    let config = AppConfig::load()?;
    let rules_path = rules.or_else(|| config.eligibility.rules_path.clone());
    let rules = load_rules(rules_path.as_deref())?;
    let outbox = Arc::new(OutboxGateway::default());
    let engine = build_engine(rules, config.eligibility.matcher(), outbox.clone());
    let user = UserId(user);

    println!("Sarvam Setu questionnaire demo (user {user})");

    let mut script = vec![
        ChatEvent::Start {
            user_id: user.clone(),
        },
        ChatEvent::BeginQuestionnaire {
            user_id: user.clone(),
        },
    ];
    for (index, (answer, typed)) in DEMO_SCRIPT.iter().enumerate() {
        if *typed {
            if show_validation {
                script.push(ChatEvent::TextMessage {
                    user_id: user.clone(),
                    text: "twenty five".to_string(),
                });
            }
            script.push(ChatEvent::TextMessage {
                user_id: user.clone(),
                text: (*answer).to_string(),
            });
        } else {
            script.push(ChatEvent::ChoiceSelected {
                user_id: user.clone(),
                event_id: EventId(format!("demo-callback-{index}")),
                message_id: Some(MessageId(format!("demo-prompt-{index}"))),
                value: (*answer).to_string(),
            });
        }
    }

    for event in script {
        println!("\n> {}", describe_event(&event));
        let outcome = engine.handle(event).await?;
        for action in outbox.drain(&user).unwrap_or_default() {
            print_action(&action);
        }
        if let EventOutcome::Completed(report) = outcome {
            println!("\nQuestionnaire finished: {}", report.label());
        }
    }

    Ok(())
}

pub(crate) async fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let rules_path = args
        .rules
        .clone()
        .or_else(|| config.eligibility.rules_path.clone());
    let rules = load_rules(rules_path.as_deref())?;
    let matcher = EligibilityMatcher::new(
        Arc::new(InMemoryRuleSource::new(rules)),
        config.eligibility.matcher(),
    );

    let answers = answers_from_args(&args);
    let report = MatchReport::from_result(matcher.find_matches(&answers).await);
    println!("{}", render_report(&report));
    Ok(())
}

fn answers_from_args(args: &MatchArgs) -> Answers {
    let mut answers = Answers::new();
    let text_answers = [
        ("state", &args.state),
        ("area", &args.area),
        ("category", &args.category),
        ("gender", &args.gender),
        ("occupation", &args.occupation),
    ];
    for (key, value) in text_answers {
        if let Some(value) = value {
            answers.insert(key.to_string(), AnswerValue::Text(value.clone()));
        }
    }
    if let Some(age) = args.age {
        answers.insert("age".to_string(), AnswerValue::Number(age));
    }
    answers.insert(
        "disability".to_string(),
        AnswerValue::Boolean(args.disability),
    );
    answers
}

fn describe_event(event: &ChatEvent) -> String {
    match event {
        ChatEvent::Start { .. } => "/start".to_string(),
        ChatEvent::BeginQuestionnaire { .. } => "/check".to_string(),
        ChatEvent::ChoiceSelected { value, .. } => format!("[tap] {value}"),
        ChatEvent::TextMessage { text, .. } => text.clone(),
    }
}

fn print_action(action: &OutboundAction) {
    match action {
        OutboundAction::Prompt { text, layout, .. } => {
            println!("  bot: {text}");
            if let Some(layout) = layout {
                for row in &layout.rows {
                    let labels: Vec<&str> = row.iter().map(|option| option.label.as_str()).collect();
                    println!("       [{}]", labels.join("] ["));
                }
            }
        }
        OutboundAction::Text { text, .. } => {
            for line in text.lines() {
                println!("  bot: {line}");
            }
        }
        OutboundAction::Retract { message_id, .. } => {
            println!("  (prompt {} removed)", message_id.0);
        }
        OutboundAction::Acknowledge { notice, .. } => {
            if let Some(notice) = notice {
                println!("  (toast) {notice}");
            }
        }
    }
}
