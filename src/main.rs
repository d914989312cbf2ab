//! Graft CLI - render and exercise documents with the built-in directives

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;

use graft::directives;
use graft::error::{FixSuggestion, GraftError};
use graft::registry::AppModule;
use graft::selector::Selector;
use graft::App;

#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Graft - bind directives and components to an HTML document")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap an HTML file with the built-in directives and print the result
    Render {
        /// Path to an HTML fragment file
        file: String,

        /// Advance the virtual clock this many milliseconds after bootstrap
        #[arg(short, long, default_value_t = 0)]
        ticks: u64,
    },

    /// Run the built-in showcase page and simulate a few interactions
    Demo,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render { file, ticks } => render(&file, ticks),
        Commands::Demo => demo(),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn bootstrap_builtins(markup: &str) -> Result<App, GraftError> {
    let mut app = App::from_html(markup)?;
    app.bootstrap(AppModule {
        declarations: directives::builtin_definitions(),
        providers: directives::builtin_providers(),
    });
    Ok(app)
}

fn render(file: &str, ticks: u64) -> Result<(), GraftError> {
    let markup = fs::read_to_string(file)?;
    let mut app = bootstrap_builtins(&markup)?;
    if ticks > 0 {
        app.advance(ticks);
    }

    let root = app.document().root();
    println!("{}", app.document().inner_html(root));
    Ok(())
}

const DEMO_PAGE: &str = r#"<counter [initial-value]="10" [step]="5"></counter>
<user-profile first-name="Lior" last-name="Chamla" job="Web developer"></user-profile>
<input phone-number with-spaces="true">
<input credit-card name="card">
<div chrono></div>"#;

fn demo() -> Result<(), GraftError> {
    let mut app = bootstrap_builtins(DEMO_PAGE)?;
    let root = app.document().root();

    println!("{}", "After bootstrap:".cyan().bold());
    println!("{}", app.document().inner_html(root));

    // click the counter's "+" button twice; each click re-renders the
    // template, so the button is a fresh element every time
    for _ in 0..2 {
        let increment = first(&app, "button")?;
        app.dispatch(increment, "click")?;
    }

    // type into the phone field
    let phone = first(&app, "[phone-number]")?;
    app.document_mut()
        .set_path(phone, "value", "0612345678".into());
    app.dispatch(phone, "input")?;

    // let the chrono run for three and a half seconds
    app.advance(3500);

    println!();
    println!("{}", "After interactions:".cyan().bold());
    println!("{}", app.document().inner_html(root));
    println!(
        "  {} phone field: {}",
        "→".cyan(),
        app.document().get_path(phone, "value")
    );
    Ok(())
}

fn first(app: &App, source: &str) -> Result<graft::NodeId, GraftError> {
    let selector = Selector::parse(source)?;
    app.document()
        .query_selector_all(&selector)
        .first()
        .copied()
        .ok_or_else(|| GraftError::SelectorParse {
            selector: source.to_string(),
            details: "no element matched".to_string(),
        })
}
