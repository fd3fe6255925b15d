//! Command dispatch: one handler per subcommand.
//!
//! Handlers return the process exit code; errors bubble up as [`CliError`].

use std::path::{Path, PathBuf};

use clap::CommandFactory;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::ArchiveRole;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::report::{FAILURE_FOOTER, FAILURE_HEADER, SUCCESS_SUMMARY};
use crate::domain::{Collection, Item, Tier, Verdict};
use crate::exitcode;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Local config file written by `config init` without `--global`.
pub const LOCAL_CONFIG_FILE: &str = "gridcheck.toml";

pub fn execute_command(cli: &Cli) -> CliResult<i32> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see gridcheck --help".to_string(),
        ));
    };

    // completion needs no settings
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(exitcode::OK);
    }

    let settings = Settings::load(cli.config.as_deref())?;
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Check {
            student_id,
            file,
            lab,
            reference,
        } => cmd_check(&container, student_id, file, *lab, reference.as_deref()),
        Commands::Parse { file, toml } => cmd_parse(&container, file, *toml),
        Commands::Review {
            textgrid,
            tier,
            reference,
            max_group,
            submissions,
        } => cmd_review(
            &container,
            textgrid,
            tier,
            reference,
            *max_group,
            submissions,
        ),
        Commands::Config { command } => cmd_config(&container, command),
        Commands::Completion { .. } => Ok(exitcode::OK),
    }
}

#[instrument(skip(container))]
fn cmd_check(
    container: &ServiceContainer,
    student_id: &str,
    file: &Path,
    lab: Option<u32>,
    reference: Option<&Path>,
) -> CliResult<i32> {
    let reference: PathBuf = match (lab, reference) {
        (_, Some(path)) => path.to_path_buf(),
        (Some(n), None) => container.settings.reference_path(n),
        (None, None) => {
            return Err(CliError::InvalidArgs(
                "either --lab or --reference is required".to_string(),
            ))
        }
    };
    debug!("reference archive: {}", reference.display());

    if !container.settings.is_known_student(student_id) {
        output::warning(&format!("student id {student_id} is not on the configured list"));
    }

    let verdict = container
        .precheck
        .check_files(student_id, file, &reference)?;

    match verdict {
        Verdict::Clean => {
            output::success(SUCCESS_SUMMARY);
            Ok(exitcode::OK)
        }
        Verdict::Discrepancies(messages) => {
            output::header(FAILURE_HEADER);
            for msg in &messages {
                output::failure(msg);
            }
            output::info(FAILURE_FOOTER);
            Ok(exitcode::FAILED)
        }
    }
}

fn cmd_parse(container: &ServiceContainer, file: &Path, as_toml: bool) -> CliResult<i32> {
    let collection = container.precheck.parse_file(file, ArchiveRole::Submission)?;

    if as_toml {
        let dumped = toml::to_string_pretty(&collection).map_err(|e| {
            CliError::Usage(format!("cannot serialize {}: {e}", file.display()))
        })?;
        output::info(&dumped);
    } else {
        output::info(&collection_tree(&collection, &file.display().to_string()));
    }
    Ok(exitcode::OK)
}

/// Entity tree as a `termtree` rooted at `root`.
pub fn collection_tree(collection: &Collection, root: &str) -> Tree<String> {
    let items = collection.items.iter().map(item_tree);
    Tree::new(format!("{root} ({} items)", collection.items.len())).with_leaves(items)
}

fn item_tree(item: &Item) -> Tree<String> {
    let (xmin, xmax) = item.bounds();
    match item {
        Item::TextGrid(tg) => Tree::new(format!(
            "TextGrid {} [{xmin}, {xmax}] ({} tiers)",
            item.name(),
            tg.tiers.len()
        ))
        .with_leaves(tg.tiers.iter().map(tier_tree)),
        Item::Sound(sound) => Tree::new(format!(
            "Sound {} [{xmin}, {xmax}] ({}x{} samples)",
            item.name(),
            sound.ny,
            sound.nx
        )),
    }
}

fn tier_tree(tier: &Tier) -> Tree<String> {
    let (xmin, xmax) = tier.bounds();
    let label = format!("{} {} [{xmin}, {xmax}]", tier.class_tag(), tier.name());
    match tier {
        Tier::Interval(it) => Tree::new(label).with_leaves(
            it.labels
                .iter()
                .map(|l| format!("[{}, {}] {:?}", l.start, l.end, l.text)),
        ),
        Tier::Text(tt) => Tree::new(label)
            .with_leaves(tt.labels.iter().map(|p| format!("{} {:?}", p.time, p.text))),
    }
}

fn cmd_review(
    container: &ServiceContainer,
    textgrid: &str,
    tier: &str,
    reference: &Path,
    max_group: Option<usize>,
    submissions: &[PathBuf],
) -> CliResult<i32> {
    let max = max_group.unwrap_or(container.settings.max_group_size);
    let groups = container
        .review
        .review(reference, submissions, textgrid, tier, max)?;

    for group in &groups {
        output::header(&group.file_stem(textgrid, tier));
        for entry in &group.entries {
            output::detail(&format!("{}: {}", entry.owner, tier_summary(&entry.tier)));
        }
    }
    Ok(exitcode::OK)
}

fn tier_summary(tier: &Tier) -> String {
    let texts: Vec<&str> = match tier {
        Tier::Interval(it) => it.texts().collect(),
        Tier::Text(tt) => tt.labels.iter().map(|p| p.text.as_str()).collect(),
    };
    format!("{} labels | {}", texts.len(), texts.join(" | "))
}

fn cmd_config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<i32> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::action("global", &"<no config directory>"),
            }
            output::action("local", &LOCAL_CONFIG_FILE);
        }
        ConfigCommands::Init { global } => {
            let target = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                PathBuf::from(LOCAL_CONFIG_FILE)
            };
            if container.fs.exists(&target) {
                return Err(CliError::Usage(format!(
                    "config file already exists: {}",
                    target.display()
                )));
            }
            container
                .fs
                .ensure_parent(&target)
                .and_then(|_| container.fs.write(&target, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
            output::success(&format!("created {}", target.display()));
        }
    }
    Ok(exitcode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Interval, IntervalTier, TextGrid};

    #[test]
    fn given_collection_when_rendering_tree_then_lists_tiers_and_labels() {
        let collection = Collection {
            size: 1,
            items: vec![Item::TextGrid(TextGrid {
                name: "T1".into(),
                xmin: 0.0,
                xmax: 1.5,
                declared_tiers: 1,
                tiers: vec![Tier::Interval(IntervalTier {
                    name: "Segment".into(),
                    xmin: 0.25,
                    xmax: 1.5,
                    declared_labels: 1,
                    labels: vec![Interval {
                        start: 0.0,
                        end: 1.0,
                        text: "a".into(),
                    }],
                })],
            })],
        };

        let rendered = collection_tree(&collection, "Lab1.Collection").to_string();

        assert!(rendered.starts_with("Lab1.Collection (1 items)"));
        assert!(rendered.contains("TextGrid T1 [0, 1.5] (1 tiers)"));
        assert!(rendered.contains("IntervalTier Segment [0.25, 1.5]"));
        assert!(rendered.contains("[0, 1] \"a\""));
    }
}
