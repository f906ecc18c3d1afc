//! Plover CLI
//!
//! Command-line interface for compiling, converting, minimizing and running
//! finite automata built from regular expressions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plover_automaton::{Automaton, TraceOutcome};
use plover_dfa::{DfaMinimizer, SubsetConfig, SubsetConstructor};
use plover_regex::RegexCompiler;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "plover")]
#[command(about = "Plover - finite automata from regular expressions", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level
    #[arg(short, long, global = true, default_value = "warn")]
    log_level: String,

    /// Maximum DFA states during subset construction (0 = unlimited)
    #[arg(long, global = true, default_value_t = SubsetConfig::default().max_states)]
    max_states: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a regex and print the resulting automaton
    Compile {
        pattern: String,

        /// Convert the NFA to a DFA
        #[arg(short, long)]
        determinize: bool,

        /// Minimize the DFA (implies --determinize)
        #[arg(short, long)]
        minimize: bool,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Check which inputs a regex accepts
    Test {
        pattern: String,

        /// Input strings
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Run the minimized DFA instead of the NFA
        #[arg(long)]
        dfa: bool,
    },

    /// Show the active states step by step for one input
    Trace {
        pattern: String,

        input: String,

        /// Trace the minimized DFA instead of the NFA
        #[arg(long)]
        dfa: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate a regex without compiling it
    Validate { pattern: String },
}

/// Every stage produced by `compile`
#[derive(Serialize)]
struct Pipeline {
    pattern: String,
    nfa: Automaton,
    #[serde(skip_serializing_if = "Option::is_none")]
    dfa: Option<Automaton>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimized: Option<Automaton>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    let converter = SubsetConstructor::new(SubsetConfig {
        max_states: cli.max_states,
    });

    match cli.command {
        Commands::Compile {
            pattern,
            determinize,
            minimize,
            json,
        } => {
            let pipeline = build(&pattern, &converter, determinize || minimize, minimize)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pipeline)?);
            } else {
                print_automaton(&pipeline.nfa);
                for stage in [&pipeline.dfa, &pipeline.minimized].into_iter().flatten() {
                    println!();
                    print_automaton(stage);
                }
            }
        }
        Commands::Test {
            pattern,
            inputs,
            dfa,
        } => {
            let automaton = target(&pattern, &converter, dfa)?;
            for input in inputs {
                let verdict = if automaton.accepts(&input) {
                    "accept"
                } else {
                    "reject"
                };
                println!("{:<8} {:?}", verdict, input);
            }
        }
        Commands::Trace {
            pattern,
            input,
            dfa,
            json,
        } => {
            let automaton = target(&pattern, &converter, dfa)?;
            let trace = automaton.trace(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&trace)?);
            } else {
                println!("start: {}", join(&trace.start));
                for step in &trace.steps {
                    println!(
                        "[{}] '{}': {} -> {}",
                        step.index,
                        step.symbol,
                        join(&step.before),
                        join(&step.after)
                    );
                }
                match &trace.outcome {
                    TraceOutcome::Accepted { final_states } => {
                        println!("accepted in {}", join(final_states))
                    }
                    TraceOutcome::Rejected { states } => {
                        println!("rejected, ended in {}", join(states))
                    }
                    TraceOutcome::Dead {
                        index,
                        symbol,
                        states,
                    } => println!(
                        "rejected, no move on '{}' at {} from {}",
                        symbol,
                        index,
                        join(states)
                    ),
                }
            }
        }
        Commands::Validate { pattern } => {
            RegexCompiler::default()
                .validate(&pattern)
                .with_context(|| format!("Invalid regex /{}/", pattern))?;
            let postfix = RegexCompiler::default().postfix(&pattern)?;
            println!("ok: /{}/ (postfix {})", pattern, postfix);
        }
    }

    Ok(())
}

fn setup_logging(level: &str) -> Result<()> {
    let level = level.parse::<Level>().unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    Ok(())
}

fn build(
    pattern: &str,
    converter: &SubsetConstructor,
    determinize: bool,
    minimize: bool,
) -> Result<Pipeline> {
    let nfa = RegexCompiler::default()
        .compile(pattern)
        .with_context(|| format!("Failed to compile /{}/", pattern))?;
    info!(states = nfa.state_count(), "Compiled NFA");

    let dfa = if determinize {
        let dfa = converter.convert(&nfa).context("Subset construction failed")?;
        info!(states = dfa.state_count(), "Built DFA");
        Some(dfa)
    } else {
        None
    };

    let minimized = match (&dfa, minimize) {
        (Some(dfa), true) => {
            let min = DfaMinimizer::new()
                .minimize(dfa)
                .context("Minimization failed")?;
            info!(states = min.state_count(), "Minimized DFA");
            Some(min)
        }
        _ => None,
    };

    Ok(Pipeline {
        pattern: pattern.to_string(),
        nfa,
        dfa,
        minimized,
    })
}

/// The automaton a command should run: the NFA, or the minimized DFA.
fn target(pattern: &str, converter: &SubsetConstructor, dfa: bool) -> Result<Automaton> {
    let pipeline = build(pattern, converter, dfa, dfa)?;
    Ok(pipeline.minimized.unwrap_or(pipeline.nfa))
}

fn print_automaton(automaton: &Automaton) {
    println!("{} [{}] ({})", automaton.name(), automaton.kind(), automaton.id());
    println!(
        "alphabet: {{{}}}",
        automaton
            .alphabet()
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    );

    println!("states ({}):", automaton.state_count());
    for state in automaton.states() {
        let marker = match (state.is_initial(), state.is_final()) {
            (true, true) => "->*",
            (true, false) => "-> ",
            (false, true) => "  *",
            (false, false) => "   ",
        };
        if state.label() == state.id() {
            println!("  {} {}", marker, state.id());
        } else {
            println!("  {} {} {}", marker, state.id(), state.label());
        }
    }

    println!("transitions ({}):", automaton.transition_count());
    for row in automaton.transition_table() {
        println!("  {} --{}--> {}", row.from, row.symbols, row.to);
    }
}

fn join<'a, I>(states: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let ids: Vec<&str> = states.into_iter().map(String::as_str).collect();
    format!("{{{}}}", ids.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_pipeline() {
        let converter = SubsetConstructor::default();
        let pipeline = build("a*b", &converter, true, true).unwrap();
        assert!(pipeline.nfa.is_nfa());
        assert!(pipeline.dfa.as_ref().is_some_and(|d| d.is_dfa()));
        assert_eq!(pipeline.minimized.as_ref().map(|m| m.state_count()), Some(2));

        let json = serde_json::to_value(&pipeline).unwrap();
        assert_eq!(json["pattern"], "a*b");
        assert!(json.get("minimized").is_some());
    }

    #[test]
    fn test_target_selection() {
        let converter = SubsetConstructor::default();
        assert!(target("ab", &converter, false).unwrap().is_nfa());
        assert!(target("ab", &converter, true).unwrap().is_dfa());
        assert!(target("(ab", &converter, false).is_err());
    }
}
